pub mod parallelism;

/// Normalized indel similarity of two strings in the range [0, 1], computed on chars.
/// Two empty strings are equal, so their similarity is 1.
pub fn char_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.;
    }

    // length of the longest common subsequence, one row at a time
    let mut row = vec![0usize; b.len() + 1];
    for x in &a {
        let mut diagonal = 0;
        for (j, y) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if x == y {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }

    (2 * row[b.len()]) as f64 / total as f64
}

pub fn starts_uppercase(string: &str) -> bool {
    string.chars().next().map_or(false, |x| x.is_uppercase())
}

/// Whether the string is non-empty and consists only of alphabetic chars.
pub fn is_alphabetic(string: &str) -> bool {
    !string.is_empty() && string.chars().all(char::is_alphabetic)
}

#[inline]
pub fn punctuation_chars() -> &'static str {
    r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##
}
