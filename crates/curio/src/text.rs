use std::collections::HashSet;
use std::sync::OnceLock;

// violet ignore chunk
/// English stop words dropped from feature text before vectorizing
const STOP_WORDS: &[&str] = &[
  // Articles and determiners
  "the", "an", "this", "that", "these", "those", "each", "every", "either", "neither", "any",
  "some", "all", "both", "few", "more", "most", "much", "many", "other", "another", "such", "no",
  "nor", "not", "only", "own", "same", "so", "than", "too", "very", "whose", "which", "what",
  // Conjunctions
  "and", "or", "but", "if", "because", "as", "until", "while", "although", "though", "whether",
  "yet", "however", "therefore", "thus", "also", "else", "otherwise",
  // Prepositions
  "in", "on", "at", "to", "for", "of", "with", "by", "over", "about", "against", "between",
  "into", "through", "during", "before", "after", "above", "below", "from", "up", "down", "out",
  "off", "under", "again", "further", "then", "once", "upon", "within", "without", "along",
  "across", "behind", "beyond", "toward", "towards", "via", "per", "among", "around", "onto",
  // Common verbs
  "is", "are", "was", "were", "be", "been", "being", "am", "have", "has", "had", "having", "do",
  "does", "did", "doing", "will", "would", "could", "should", "shall", "may", "might", "must",
  "can", "cannot", "get", "got", "become", "became", "becomes", "seem", "seems", "seemed",
  // Pronouns
  "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours", "yourself",
  "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself", "it", "its",
  "itself", "they", "them", "their", "theirs", "themselves", "us", "who", "whom", "one",
  // Adverbs and fillers
  "here", "there", "when", "where", "why", "how", "just", "now", "ever", "never", "always",
  "often", "still", "already", "even", "well", "back", "away", "almost", "rather", "quite",
  "perhaps", "etc", "ie", "eg",
];

fn stop_words() -> &'static HashSet<&'static str> {
  static WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
  WORDS.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Whether a lower-cased token is a stop word
pub fn is_stop_word(token: &str) -> bool {
  stop_words().contains(token)
}

/// Fold a title into its lookup key: lower-cased, trimmed, whitespace runs collapsed
pub fn normalize_title(title: &str) -> String {
  title.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join(" ")
}

/// Split text into lower-cased word tokens, dropping stop words.
///
/// A token is a run of alphanumeric characters (or `_`) at least two
/// characters long. Everything else separates tokens, so hyphenated tags
/// such as `data-science` yield `data` and `science`.
pub fn tokenize(text: &str) -> Vec<String> {
  text
    .split(|c: char| !(c.is_alphanumeric() || c == '_'))
    .filter(|word| word.chars().count() >= 2)
    .map(str::to_lowercase)
    .filter(|word| !is_stop_word(word))
    .collect()
}

/// Join the descriptive fields of a course into a single feature string
pub fn feature_text<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
  fields.into_iter().map(str::trim).filter(|field| !field.is_empty()).collect::<Vec<_>>().join(" ")
}
