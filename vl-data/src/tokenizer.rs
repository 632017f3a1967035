//! The tokenizer interface consumed by the assembler and the encoder.

use crate::common::*;

/// The marker prepended to every token sequence.
pub const CLS_TOKEN: &str = "[CLS]";
/// The marker appended after the caption.
pub const SEP_TOKEN: &str = "[SEP]";
/// The replacement of a masked token.
pub const MASK_TOKEN: &str = "[MASK]";
/// The fallback of out-of-vocabulary tokens.
pub const UNK_TOKEN: &str = "[UNK]";

const MAX_RANDOM_TOKEN_ATTEMPTS: usize = 64;

/// Subword tokenizer with a fixed vocabulary.
pub trait Tokenizer
where
    Self: Send + Sync,
{
    /// Split a text into subword tokens.
    fn tokenize(&self, text: &str) -> Result<Vec<String>>;

    /// Look up the vocabulary id of a token.
    fn token_to_id(&self, token: &str) -> Option<u32>;

    /// Look up the token of a vocabulary id.
    fn id_to_token(&self, id: u32) -> Option<String>;

    /// The number of entries in the vocabulary.
    fn vocab_size(&self) -> usize;
}

/// Vocabulary helpers shared by every [Tokenizer].
pub trait TokenizerExt: Tokenizer {
    fn unk_id(&self) -> Result<u32> {
        self.token_to_id(UNK_TOKEN)
            .ok_or_else(|| format_err!("the vocabulary has no '{}' token", UNK_TOKEN))
    }

    /// Look up a token id, falling back to the unknown token id.
    fn token_to_id_or_unk(&self, token: &str) -> Result<u32> {
        match self.token_to_id(token) {
            Some(id) => Ok(id),
            None => {
                warn!(
                    "Cannot find token '{}' in vocab. Using {} instead",
                    token, UNK_TOKEN
                );
                self.unk_id()
            }
        }
    }

    fn convert_tokens_to_ids<S>(&self, tokens: &[S]) -> Result<Vec<u32>>
    where
        S: AsRef<str>,
    {
        tokens
            .iter()
            .map(|token| self.token_to_id_or_unk(token.as_ref()))
            .try_collect()
    }

    /// Draw a token uniformly from the vocabulary.
    fn random_token<R>(&self, rng: &mut R) -> Result<String>
    where
        R: Rng + ?Sized,
    {
        let vocab_size = self.vocab_size();
        ensure!(vocab_size > 0, "the vocabulary is empty");

        (0..MAX_RANDOM_TOKEN_ATTEMPTS)
            .find_map(|_| self.id_to_token(rng.gen_range(0..vocab_size) as u32))
            .ok_or_else(|| format_err!("unable to draw a token from the vocabulary"))
    }
}

impl<T> TokenizerExt for T where T: Tokenizer + ?Sized {}

impl Tokenizer for tokenizers::Tokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let encoding = self
            .encode(text, false)
            .map_err(|err| format_err!("unable to tokenize '{}': {}", text, err))?;
        Ok(encoding.get_tokens().to_vec())
    }

    fn token_to_id(&self, token: &str) -> Option<u32> {
        tokenizers::Tokenizer::token_to_id(self, token)
    }

    fn id_to_token(&self, id: u32) -> Option<String> {
        tokenizers::Tokenizer::id_to_token(self, id)
    }

    fn vocab_size(&self) -> usize {
        self.get_vocab_size(true)
    }
}

/// Load a serialized HuggingFace tokenizer file.
pub fn load_tokenizer<P>(path: P) -> Result<Arc<dyn Tokenizer>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let tokenizer = tokenizers::Tokenizer::from_file(path)
        .map_err(|err| format_err!("unable to load tokenizer '{}': {}", path.display(), err))?;
    Ok(Arc::new(tokenizer))
}
