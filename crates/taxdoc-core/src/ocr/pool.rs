//! Bounded pool running blocking OCR calls off the async runtime.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{error, trace};

use super::selector::OcrService;
use super::{MethodUsed, OcrMethod, OcrResult};

/// At most `workers` OCR calls run at once, each on a blocking thread.
#[derive(Clone)]
pub struct OcrPool {
    service: Arc<OcrService>,
    permits: Arc<Semaphore>,
    workers: usize,
}

impl OcrPool {
    pub fn new(service: Arc<OcrService>, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            service,
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn service(&self) -> &OcrService {
        &self.service
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run [`OcrService::extract_text`] without blocking the caller's task.
    pub async fn extract_text(&self, path: PathBuf, method: OcrMethod) -> OcrResult {
        let start = Instant::now();

        let permit = match self.permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => return OcrResult::failed(MethodUsed::None, e, start.elapsed()),
        };
        trace!("OCR worker acquired for {}", path.display());

        let service = Arc::clone(&self.service);
        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            service.extract_text(&path, method)
        })
        .await;

        match joined {
            Ok(result) => result,
            Err(e) => {
                error!("OCR worker panicked: {}", e);
                OcrResult::failed(MethodUsed::None, e, start.elapsed())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::error::OcrError;
    use crate::ocr::{Engine, EngineRegistry, OcrBackend, RecognizedText};

    /// Records the highest number of concurrent calls.
    struct Slow {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl OcrBackend for Slow {
        fn engine(&self) -> Engine {
            Engine::Tesseract
        }

        fn recognize(&self, _image_path: &Path) -> Result<RecognizedText, OcrError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(30));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(RecognizedText::new("ok", 0.6))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pool_bounds_concurrency() {
        let backend = Arc::new(Slow {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let registry = EngineRegistry::from_backends(vec![backend.clone() as Arc<dyn OcrBackend>]);
        let pool = OcrPool::new(Arc::new(OcrService::new(Arc::new(registry))), 2);

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    pool.extract_text(PathBuf::from(format!("page-{}.png", i)), OcrMethod::Auto)
                        .await
                })
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap();
            assert_eq!(result.method_used, MethodUsed::Tesseract);
            assert_eq!(result.extracted_text, "ok");
        }

        assert!(backend.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.workers(), 2);
    }

    #[tokio::test]
    async fn test_zero_workers_is_clamped() {
        let pool = OcrPool::new(Arc::new(OcrService::new(Arc::new(EngineRegistry::empty()))), 0);
        assert_eq!(pool.workers(), 1);

        let result = pool
            .extract_text(PathBuf::from("missing.png"), OcrMethod::Auto)
            .await;
        assert_eq!(result.method_used, MethodUsed::None);
    }
}
