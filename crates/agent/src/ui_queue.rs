use std::future::Future;

use tokio::sync::Mutex;

/// Strictly serialized job queue for the side task.
///
/// Jobs run one at a time in submission order. Nothing else shares it.
#[derive(Debug, Default)]
pub struct UiQueue {
    slot: Mutex<()>,
}

impl UiQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for every earlier job to finish, then run `job`.
    pub async fn run<F, T>(&self, job: F) -> T
    where
        F: Future<Output = T>,
    {
        let _turn = self.slot.lock().await;
        job.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn jobs_never_overlap() {
        let queue = Arc::new(UiQueue::new());
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 0..3 {
            let queue = queue.clone();
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                queue
                    .run(async {
                        log.lock().unwrap().push(format!("start {i}"));
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        log.lock().unwrap().push(format!("end {i}"));
                    })
                    .await
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let log = log.lock().unwrap();
        for pair in log.chunks(2) {
            let a = pair[0].strip_prefix("start ").unwrap();
            let b = pair[1].strip_prefix("end ").unwrap();
            assert_eq!(a, b);
        }
    }
}
