//! Compile worker pool.

use std::thread;

use lgn_asset_catalog::AssetMetaInfo;
use lgn_asset_compiler::{AssetCompiler, CompileError, CompileRequest};
use tracing::debug;

/// Compiles `requests` on `jobs` worker threads sharing `compiler`.
///
/// Returns one result per request, in request order. A failed request does
/// not stop the others.
pub fn compile_all(
    compiler: &AssetCompiler,
    requests: Vec<CompileRequest>,
    jobs: usize,
) -> Vec<Result<AssetMetaInfo, CompileError>> {
    let request_count = requests.len();
    let workers = jobs.clamp(1, request_count.max(1));
    debug!("compiling {} assets on {} workers", request_count, workers);

    let (job_tx, job_rx) = crossbeam_channel::unbounded();
    for job in requests.into_iter().enumerate() {
        // the receiver is alive: sending cannot fail.
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    let (result_tx, result_rx) = crossbeam_channel::unbounded();
    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for (index, request) in job_rx {
                    let result = compiler.compile(&request);
                    if result_tx.send((index, result)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut results: Vec<_> = result_rx.into_iter().collect();
    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, result)| result).collect()
}
