//! Bounded-concurrency fetch pool.
//!
//! Every link is pushed into one unbounded queue and drained by a fixed
//! number of workers. The producer owns the only sender, so a worker sees
//! the queue end only once all links have been pushed *and* taken. The pool
//! returns after every worker has seen the end and finished its last fetch.
//!
//! Workers are plain futures joined on the caller's task. They all share the
//! caller's [`Fetcher`] and so its connection pool.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::models::{FetchResult, LinkSet};
use crate::scrapers::fetch::Fetcher;
use futures::future::join_all;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, instrument};

type LinkQueue = Mutex<mpsc::UnboundedReceiver<String>>;

/// Fetch every link with at most `concurrency` requests in flight.
///
/// Failures are reported to `diagnostics` and returned as
/// [`FetchResult::Failure`]; they never stop a worker.
///
/// # Arguments
///
/// * `fetcher` - Shared HTTP session used by every worker
/// * `links` - Deduplicated article URLs to fetch
/// * `concurrency` - Number of workers (at least one is started)
/// * `diagnostics` - Receives one [`Diagnostic::FetchFailed`] per failed link
///
/// # Returns
///
/// Exactly one [`FetchResult`] per link, in completion order.
#[instrument(level = "info", skip_all, fields(links = links.len(), concurrency = concurrency))]
pub async fn run_pool<F: Fetcher>(
    fetcher: &F,
    links: LinkSet,
    concurrency: usize,
    diagnostics: &dyn Diagnostics,
) -> Vec<FetchResult> {
    let (tx, rx) = mpsc::unbounded_channel();
    let queue: LinkQueue = Mutex::new(rx);

    let producer = async move {
        let mut pushed = 0usize;
        for link in links {
            if tx.send(link).is_err() {
                break;
            }
            pushed += 1;
        }
        debug!(pushed, "All links queued");
        // `tx` drops here, closing the queue once it drains.
    };

    let workers = (0..concurrency.max(1)).map(|id| worker(id, fetcher, &queue, diagnostics));
    let ((), per_worker) = tokio::join!(producer, join_all(workers));

    let results: Vec<FetchResult> = per_worker.into_iter().flatten().collect();
    let succeeded = results.iter().filter(|r| r.is_success()).count();
    info!(
        total = results.len(),
        succeeded,
        failed = results.len() - succeeded,
        "Fetch pool drained"
    );
    results
}

async fn worker<F: Fetcher>(
    id: usize,
    fetcher: &F,
    queue: &LinkQueue,
    diagnostics: &dyn Diagnostics,
) -> Vec<FetchResult> {
    let mut results = Vec::new();
    loop {
        let next = queue.lock().await.recv().await;
        let Some(link) = next else {
            break;
        };

        let result = match fetcher.fetch(&link).await {
            Ok(page) => FetchResult::Success {
                body: page.body,
                final_url: page.final_url,
            },
            Err(err) => {
                let reason = err.kind();
                diagnostics.report(Diagnostic::FetchFailed {
                    link: link.clone(),
                    kind: reason,
                    detail: err.to_string(),
                });
                FetchResult::Failure { link, reason }
            }
        };
        results.push(result);
    }
    debug!(worker = id, handled = results.len(), "Worker found queue closed");
    results
}
