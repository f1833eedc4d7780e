//! Caption text for the post

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::constants::{
    CAPTION_MAX_CHARS, ELLIPSIS, EMOJI_POOL, HASHTAGS, HASHTAG_CHANCE, NONSENSE, NONSENSE_CHANCE,
};

const EMOJI_MIN: usize = 2;
const EMOJI_MAX: usize = 6;

/// Decorates `quote` with a run of emoji and maybe a nonsense phrase and a
/// hashtag, capped at [CAPTION_MAX_CHARS].
pub fn build_caption<R: Rng + ?Sized>(quote: &str, rng: &mut R) -> String {
    let emoji_count = rng.random_range(EMOJI_MIN..=EMOJI_MAX);
    let emojis: String = (0..emoji_count)
        .filter_map(|_| EMOJI_POOL.choose(rng).copied())
        .collect();

    let hashtag = if rng.random_bool(HASHTAG_CHANCE) {
        HASHTAGS.choose(rng).copied().unwrap_or_default()
    } else {
        ""
    };
    let nonsense = if rng.random_bool(NONSENSE_CHANCE) {
        NONSENSE.choose(rng).copied().unwrap_or_default()
    } else {
        ""
    };

    join_fragments(&[&emojis, quote, nonsense, hashtag])
}

/// Joins the non-blank fragments with single spaces and applies the length cap.
pub fn join_fragments(fragments: &[&str]) -> String {
    let joined = fragments
        .iter()
        .map(|fragment| fragment.trim())
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    truncate_caption(joined)
}

/// Cuts `caption` to at most [CAPTION_MAX_CHARS] characters, ending in
/// [ELLIPSIS] when anything was dropped.
pub fn truncate_caption(caption: String) -> String {
    if caption.chars().count() <= CAPTION_MAX_CHARS {
        return caption;
    }
    let keep = CAPTION_MAX_CHARS - ELLIPSIS.chars().count();
    let mut truncated: String = caption.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Strips the leading emoji run, returning how many emoji it held.
    fn count_leading_emoji(caption: &str) -> (usize, &str) {
        let mut rest = caption;
        let mut count = 0;
        // longest first so the two-codepoint pepper wins over any prefix
        let mut pool = EMOJI_POOL.to_vec();
        pool.sort_by_key(|emoji| std::cmp::Reverse(emoji.len()));
        while let Some(emoji) = pool.iter().find(|emoji| rest.starts_with(**emoji)) {
            rest = &rest[emoji.len()..];
            count += 1;
        }
        (count, rest)
    }

    #[test]
    fn test_caption_layout() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let caption = build_caption("I came. I saw.", &mut rng);
            let (count, rest) = count_leading_emoji(&caption);
            assert!((EMOJI_MIN..=EMOJI_MAX).contains(&count), "{caption}");
            assert!(rest.starts_with(" I came. I saw."), "{caption}");

            let tail = rest.trim_start_matches(" I came. I saw.");
            let tail_ok = tail.is_empty()
                || NONSENSE.iter().any(|n| tail.starts_with(&format!(" {n}")))
                || HASHTAGS.iter().any(|h| tail == format!(" {h}"));
            assert!(tail_ok, "unexpected tail {tail:?}");
        }
    }

    #[test]
    fn test_blank_quote_is_dropped() {
        let mut rng = StdRng::seed_from_u64(9);
        let caption = build_caption(" ", &mut rng);
        assert!(!caption.contains("  "));
        assert_eq!(caption, caption.trim());
    }

    #[test]
    fn test_long_caption_is_truncated() {
        let mut rng = StdRng::seed_from_u64(10);
        let quote = "blah ".repeat(100);
        let caption = build_caption(&quote, &mut rng);
        assert_eq!(caption.chars().count(), CAPTION_MAX_CHARS);
        assert!(caption.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_short_caption_untouched() {
        let caption = join_fragments(&["🔥🔥", "", "hello", "#meme"]);
        assert_eq!(caption, "🔥🔥 hello #meme");
        let exact = "x".repeat(CAPTION_MAX_CHARS);
        assert_eq!(truncate_caption(exact.clone()), exact);
    }

    #[test]
    fn test_truncation_counts_characters() {
        let caption = truncate_caption("é".repeat(300));
        assert_eq!(caption.chars().count(), CAPTION_MAX_CHARS);
        assert!(caption.starts_with("éé"));
    }
}
