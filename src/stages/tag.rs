//! Annotation stage: adds tags, never touches pixels.

use crate::pipeline::{Processed, Processor, ProcessorContext, StageError};
use crate::tags::Tags;
use std::fmt;
use std::sync::Arc;

type TagFn = dyn Fn(&Processed) -> Tags + Send + Sync;

/// Adds tags to every image. Always returns exactly one output per input.
#[derive(Clone)]
pub struct Tagger {
    tag_by: Arc<TagFn>,
}

impl fmt::Debug for Tagger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tagger").finish_non_exhaustive()
    }
}

impl Tagger {
    /// Add the same tags to every image.
    pub fn fixed(tags: Tags) -> Self {
        Self::by(move |_| tags.clone())
    }

    /// Compute the tags to add from each image.
    pub fn by<F>(tag_by: F) -> Self
    where
        F: Fn(&Processed) -> Tags + Send + Sync + 'static,
    {
        Self {
            tag_by: Arc::new(tag_by),
        }
    }
}

impl Processor for Tagger {
    fn process(&self, ctx: &ProcessorContext<'_>) -> Result<Vec<Processed>, StageError> {
        let input = ctx.image();
        let add = (self.tag_by)(input);
        Ok(vec![input.with_tags(&add)])
    }

    fn name(&self) -> &str {
        "tag"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::CancelToken;
    use crate::tags::ORIGINAL;
    use crate::test_helpers::{process_original, sample_image};

    #[test]
    fn fixed_tags_are_added() {
        let img = sample_image(8, 8);
        let tagger = Tagger::fixed(Tags::new(["foo", "bar"]));

        let out = process_original(&tagger, img.clone()).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(*out[0].image, img);
        assert!(out[0].original);
        assert_eq!(out[0].tags.as_slice(), &[ORIGINAL, "foo", "bar"]);
    }

    #[test]
    fn tagging_twice_is_idempotent() {
        let tagger = Tagger::fixed(Tags::new(["foo", "bar"]));
        let token = CancelToken::new();
        let input = Processed::original(sample_image(2, 2));

        let once = tagger
            .process(&ProcessorContext::new(&token, &input))
            .unwrap();
        let twice = tagger
            .process(&ProcessorContext::new(&token, &once[0]))
            .unwrap();

        assert_eq!(once[0].tags, twice[0].tags);
    }

    #[test]
    fn tag_by_sees_the_image() {
        let tagger = Tagger::by(|p| {
            let kind = if p.original { "original" } else { "non-original" };
            Tags::new([format!("tagby:{kind}")])
        });
        let token = CancelToken::new();

        let original = Processed::original(sample_image(2, 2));
        let derived = Processed::derived(sample_image(2, 2), Tags::new(["resized"]));

        let a = tagger
            .process(&ProcessorContext::new(&token, &original))
            .unwrap();
        let b = tagger
            .process(&ProcessorContext::new(&token, &derived))
            .unwrap();

        assert!(a[0].tags.contains("tagby:original"));
        assert_eq!(b[0].tags.as_slice(), &["resized", "tagby:non-original"]);
        // input not mutated
        assert_eq!(derived.tags.as_slice(), &["resized"]);
    }
}
