use super::*;

/// Vocabulary of the demo word generator.
pub const DEFAULT_VOCABULARY: [&str; 5] = ["hello", "world", "hey", "no", "yes"];

/// Supplies the text of each produced message.
pub trait TextSource: Send {
    fn generate_text(&mut self) -> String;
}

impl<T: TextSource + ?Sized> TextSource for Box<T> {
    fn generate_text(&mut self) -> String {
        (**self).generate_text()
    }
}

/// A [`TextSource`] backed by a closure; see [`from_fn`].
pub struct FnSource<F>(F);

/// Wrap `f` as a [`TextSource`].
pub fn from_fn<F>(f: F) -> FnSource<F>
where
    F: FnMut() -> String + Send,
{
    FnSource(f)
}

impl<F> TextSource for FnSource<F>
where
    F: FnMut() -> String + Send,
{
    fn generate_text(&mut self) -> String {
        (self.0)()
    }
}

/// Space-separated words drawn uniformly (with repetition) from a vocabulary.
#[derive(Debug, Clone)]
pub struct RandomWords {
    rng: StdRng,
    vocabulary: Vec<String>,
    min_words: usize,
    max_words: usize,
}

impl RandomWords {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic output for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            vocabulary: DEFAULT_VOCABULARY.iter().map(|w| w.to_string()).collect(),
            min_words: 2,
            max_words: 10,
        }
    }

    pub fn with_vocabulary<I, S>(mut self, words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let vocabulary: Vec<String> = words.into_iter().map(Into::into).collect();
        if vocabulary.is_empty() {
            return Err(Error::configuration("word vocabulary must not be empty"));
        }
        self.vocabulary = vocabulary;
        Ok(self)
    }

    /// Number of words per message, drawn uniformly from `min..=max`.
    pub fn with_word_count(mut self, min: usize, max: usize) -> Result<Self> {
        if min == 0 || min > max {
            return Err(Error::configuration(format!(
                "invalid word count range {min}..={max}"
            )));
        }
        self.min_words = min;
        self.max_words = max;
        Ok(self)
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }
}

impl Default for RandomWords {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSource for RandomWords {
    fn generate_text(&mut self) -> String {
        let count = self.rng.gen_range(self.min_words..=self.max_words);
        let mut words = Vec::with_capacity(count);
        for _ in 0..count {
            if let Some(word) = self.vocabulary.choose(&mut self.rng) {
                words.push(word.as_str());
            }
        }
        words.join(" ")
    }
}
