//! Trait seams to external collaborators.

use async_trait::async_trait;

use crate::error::CorrectError;
use crate::types::Chunk;

/// In-process seam to the correction collaborator.
///
/// Implementations own their provider-side parallelism limits and retry
/// policy; the engine records whatever outcome they deliver as a terminal
/// fact about the chunk.
#[async_trait]
pub trait Corrector: Send + Sync {
    /// Name of this corrector, for logs.
    fn name(&self) -> &str;

    /// Correct one chunk, returning the corrected text.
    async fn correct(&self, chunk: &Chunk) -> Result<String, CorrectError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    struct UppercaseCorrector;

    #[async_trait]
    impl Corrector for UppercaseCorrector {
        fn name(&self) -> &str {
            "uppercase"
        }

        async fn correct(&self, chunk: &Chunk) -> Result<String, CorrectError> {
            Ok(chunk.content.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_corrector_object_safety() {
        let corrector: Box<dyn Corrector> = Box::new(UppercaseCorrector);
        let chunk = Chunk {
            id: Uuid::new_v4(),
            content: "hello".to_string(),
            original_range: 0..5,
            length: 5,
            is_final: true,
        };

        assert_eq!(corrector.name(), "uppercase");
        assert_eq!(corrector.correct(&chunk).await.unwrap(), "HELLO");
    }
}
