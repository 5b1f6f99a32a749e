//! Token estimation and batch planning.
//!
//! Without a tokenizer we estimate ~4 characters per token, which is
//! conservative for both prose and file paths.

use super::prompt::{build_prompt, render_descriptor};
use super::{ClassifyError, FileDescriptor};

/// Which of the two models a batch is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTarget {
    Default,
    LongContext,
}

#[derive(Debug, Clone)]
pub struct Batch {
    pub target: ModelTarget,
    pub files: Vec<FileDescriptor>,
}

/// Estimate token count for a string (quick approximation).
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4 + 1
}

/// Tokens one descriptor adds to a batch: its prompt section plus its line
/// in the JSON response.
pub fn descriptor_tokens(descriptor: &FileDescriptor) -> usize {
    let path_tokens = estimate_tokens(&descriptor.path.to_string_lossy());
    estimate_tokens(&render_descriptor(descriptor)) + path_tokens + 6
}

/// Tokens used by the prompt before any file is added.
pub fn prompt_overhead_tokens() -> usize {
    estimate_tokens(&build_prompt(&[]))
}

/// Split descriptors into batches that fit their model's budget.
///
/// Descriptors that fit the default model on their own go to it; the rest go
/// to the long-context model. Within each model, descriptors are packed
/// greedily in input order, at most `max_batch_files` per batch. Default
/// batches come first.
pub fn plan_batches(
    files: Vec<FileDescriptor>,
    context_tokens: usize,
    long_context_tokens: usize,
    max_batch_files: usize,
) -> Result<Vec<Batch>, ClassifyError> {
    let overhead = prompt_overhead_tokens();
    let mut default_files = Vec::new();
    let mut long_files = Vec::new();

    for descriptor in files {
        let tokens = descriptor_tokens(&descriptor);
        if overhead + tokens <= context_tokens {
            default_files.push((descriptor, tokens));
        } else if overhead + tokens <= long_context_tokens {
            long_files.push((descriptor, tokens));
        } else {
            return Err(ClassifyError::TooLarge {
                path: descriptor.path,
                tokens: overhead + tokens,
                budget: long_context_tokens,
            });
        }
    }

    let mut batches = pack(
        default_files,
        ModelTarget::Default,
        context_tokens - overhead.min(context_tokens),
        max_batch_files,
    );
    batches.extend(pack(
        long_files,
        ModelTarget::LongContext,
        long_context_tokens - overhead.min(long_context_tokens),
        max_batch_files,
    ));
    Ok(batches)
}

fn pack(
    files: Vec<(FileDescriptor, usize)>,
    target: ModelTarget,
    budget: usize,
    max_batch_files: usize,
) -> Vec<Batch> {
    let max_batch_files = max_batch_files.max(1);
    let mut batches = Vec::new();
    let mut current = Vec::new();
    let mut used = 0;

    for (descriptor, tokens) in files {
        if !current.is_empty() && (used + tokens > budget || current.len() >= max_batch_files) {
            batches.push(Batch {
                target,
                files: std::mem::take(&mut current),
            });
            used = 0;
        }
        used += tokens;
        current.push(descriptor);
    }
    if !current.is_empty() {
        batches.push(Batch {
            target,
            files: current,
        });
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn paths(batch: &Batch) -> Vec<PathBuf> {
        batch.files.iter().map(|f| f.path.clone()).collect()
    }

    fn with_excerpt(path: &str, chars: usize) -> FileDescriptor {
        FileDescriptor {
            path: PathBuf::from(path),
            excerpt: Some("a".repeat(chars)),
        }
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 1);
        assert_eq!(estimate_tokens("abcdefgh"), 3);
        // Counts characters, not bytes
        assert_eq!(estimate_tokens("éééé"), 2);
    }

    #[test]
    fn test_single_batch_when_everything_fits() {
        let files = vec![FileDescriptor::new("a.rs"), FileDescriptor::new("b.md")];
        let batches = plan_batches(files, 100_000, 200_000, 10).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].target, ModelTarget::Default);
        assert_eq!(
            paths(&batches[0]),
            vec![PathBuf::from("a.rs"), PathBuf::from("b.md")]
        );
    }

    #[test]
    fn test_max_batch_files_splits_in_order() {
        let files: Vec<_> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|p| FileDescriptor::new(*p))
            .collect();
        let batches = plan_batches(files, 100_000, 200_000, 2).unwrap();
        let sizes: Vec<usize> = batches.iter().map(|b| b.files.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(paths(&batches[2]), vec![PathBuf::from("e")]);
    }

    #[test]
    fn test_token_budget_splits_batches() {
        let overhead = prompt_overhead_tokens();
        let one = descriptor_tokens(&with_excerpt("a.txt", 400));
        // Room for two descriptors but not three
        let budget = overhead + one * 2 + one / 2;
        let files = vec![
            with_excerpt("a.txt", 400),
            with_excerpt("b.txt", 400),
            with_excerpt("c.txt", 400),
        ];

        let batches = plan_batches(files, budget, budget * 4, 50).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].files.len(), 2);
        assert_eq!(paths(&batches[1]), vec![PathBuf::from("c.txt")]);
        assert!(batches.iter().all(|b| b.target == ModelTarget::Default));
    }

    #[test]
    fn test_oversized_descriptor_goes_to_long_context() {
        let overhead = prompt_overhead_tokens();
        let budget = overhead + 200;
        let files = vec![
            FileDescriptor::new("small.rs"),
            with_excerpt("huge.rs", 4_000),
            FileDescriptor::new("other.rs"),
        ];

        let batches = plan_batches(files, budget, overhead + 5_000, 50).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].target, ModelTarget::Default);
        assert_eq!(
            paths(&batches[0]),
            vec![PathBuf::from("small.rs"), PathBuf::from("other.rs")]
        );
        assert_eq!(batches[1].target, ModelTarget::LongContext);
        assert_eq!(paths(&batches[1]), vec![PathBuf::from("huge.rs")]);
    }

    #[test]
    fn test_too_large_for_both_models() {
        let overhead = prompt_overhead_tokens();
        let files = vec![with_excerpt("enormous.rs", 40_000)];
        let err = plan_batches(files, overhead + 100, overhead + 1_000, 50).unwrap_err();
        match err {
            ClassifyError::TooLarge { path, budget, .. } => {
                assert_eq!(path, PathBuf::from("enormous.rs"));
                assert_eq!(budget, overhead + 1_000);
            }
            other => panic!("Wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(plan_batches(Vec::new(), 10, 20, 5).unwrap().is_empty());
    }
}
