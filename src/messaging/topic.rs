//! Topic-exchange routing.
//!
//! Routing keys and binding patterns are lists of words separated by `.`.
//! In a pattern, `*` matches exactly one word and `#` matches zero or more
//! words:
//!
//! | pattern          | `user.7` | `user.7.email` | `user` |
//! |------------------|----------|----------------|--------|
//! | `user.*`         | yes      | no             | no     |
//! | `user.#`         | yes      | yes            | yes    |
//! | `#`              | yes      | yes            | yes    |
//! | `*.7`            | yes      | no             | no     |

/// Returns `true` when `routing_key` is routed to a binding with `pattern`.
pub fn topic_matches(pattern: &str, routing_key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = if routing_key.is_empty() {
        Vec::new()
    } else {
        routing_key.split('.').collect()
    };

    matches_words(&pattern, &key)
}

fn matches_words(pattern: &[&str], key: &[&str]) -> bool {
    match pattern.split_first() {
        None => key.is_empty(),
        Some((&"#", rest)) => (0..=key.len()).any(|skip| matches_words(rest, &key[skip..])),
        Some((&"*", rest)) => !key.is_empty() && matches_words(rest, &key[1..]),
        Some((word, rest)) => key.first() == Some(word) && matches_words(rest, &key[1..]),
    }
}
