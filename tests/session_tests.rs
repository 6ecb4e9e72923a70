//! Async session: recompilation, detection and cached code lenses across edits
#![recursion_limit = "256"]
mod common;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::{ether_sol, unit, ETHER_PATH, ETHER_TEXT};
use solir::config::{AnalysisConfig, CodeLensConfig};
use solir::{AnalysisSession, AstProducer, ByteRange, CompilationUnitInput, Error, ForwardChanges, Result};
use tokio::sync::Notify;

/// Producer serving the Ether.sol unit, optionally failing.
///
/// With `gate` set, a compilation signals `started` and then blocks until
/// `release` is notified.
#[derive(Clone, Default)]
struct EtherProducer {
    fail: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
    gate: Arc<AtomicBool>,
    started: Arc<Notify>,
    release: Arc<Notify>,
    /// Overlay paths seen by each compilation
    overlays: Arc<Mutex<Vec<Vec<PathBuf>>>>,
}

#[async_trait]
impl AstProducer for EtherProducer {
    async fn compile(
        &self,
        _paths: &[PathBuf],
        overlay: &HashMap<PathBuf, String>,
    ) -> Result<Vec<CompilationUnitInput>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.overlays.lock().unwrap().push(overlay.keys().cloned().collect());
        if self.gate.load(Ordering::SeqCst) {
            self.started.notify_one();
            self.release.notified().await;
        }
        tokio::task::yield_now().await;
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Compiler("solc exited with status 1".to_string()));
        }
        Ok(vec![unit(vec![ether_sol()])])
    }
}

fn ether_path() -> PathBuf {
    PathBuf::from(ETHER_PATH)
}

async fn ready_session() -> AnalysisSession<EtherProducer> {
    let session = AnalysisSession::new(EtherProducer::default(), AnalysisConfig::default());
    let failures = session.recompile(&[ether_path()]).await.unwrap();
    assert!(failures.is_empty());
    session
}

#[tokio::test]
async fn test_recompile_then_detect() {
    let session = ready_session().await;
    assert_eq!(session.live_files().await, vec![ether_path()]);

    let report = session.detect().await.unwrap();
    assert!(report.failures.is_empty());
    assert_eq!(report.len(), 2);
}

#[tokio::test]
async fn test_code_lens_from_fresh_ir() {
    let session = ready_session().await;
    let lenses = session.code_lens(Path::new(ETHER_PATH)).await.unwrap().unwrap();
    assert_eq!(lenses.len(), 12);
    assert!(session.code_lens(Path::new("/project/contracts/Missing.sol")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_code_lens_survives_edit_before_recompile() {
    let session = ready_session().await;
    let path = Path::new(ETHER_PATH);
    let before = session.code_lens(path).await.unwrap().unwrap();

    let mut changes = ForwardChanges::new();
    changes.insert(0, 1);
    session.file_changed(path, format!("\n{}", ETHER_TEXT), changes).await;
    assert!(session.live_files().await.is_empty());

    let after = session.code_lens(path).await.unwrap().unwrap();
    assert_eq!(after.len(), before.len());
    for (old, new) in before.iter().zip(&after) {
        assert_eq!(new.command, old.command);
        assert_eq!(new.range.start.line, old.range.start.line + 1);
        assert_eq!(new.range.end.line, old.range.end.line + 1);
    }

    // a second edit inside `pay` invalidates only its lens
    let inside = ETHER_TEXT.find("transfer(1)").unwrap() + "transfer(".len();
    let mut changes = ForwardChanges::new();
    changes.replace(ByteRange::new(inside, inside + 1), 1);
    let edited = format!("\n{}", ETHER_TEXT.replacen("transfer(1)", "transfer(2)", 1));
    session.file_changed(path, edited, changes).await;

    let after = session.code_lens(path).await.unwrap().unwrap();
    assert_eq!(after.len(), 11);
    assert!(after.iter().all(|l| l.command.arguments[1] != "B.pay"));

    // recompiling brings back fresh lenses
    session.recompile(&[ether_path()]).await.unwrap();
    assert_eq!(session.code_lens(path).await.unwrap().unwrap().len(), 12);
}

#[tokio::test]
async fn test_disabled_code_lens() {
    let config = AnalysisConfig {
        code_lens: CodeLensConfig { enable: false },
        ..AnalysisConfig::default()
    };
    let session = AnalysisSession::new(EtherProducer::default(), config);
    session.recompile(&[ether_path()]).await.unwrap();
    assert!(session.code_lens(Path::new(ETHER_PATH)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_compiler_error_does_not_block_requests() {
    let producer = EtherProducer::default();
    let session = AnalysisSession::new(producer.clone(), AnalysisConfig::default());

    producer.fail.store(true, Ordering::SeqCst);
    let err = session.recompile(&[ether_path()]).await.unwrap_err();
    assert!(matches!(err, Error::Compiler(_)));

    let report = tokio::time::timeout(Duration::from_secs(5), session.detect())
        .await
        .expect("detect waited on a failed compilation")
        .unwrap();
    assert!(report.is_empty());

    producer.fail.store(false, Ordering::SeqCst);
    session.recompile(&[ether_path()]).await.unwrap();
    assert_eq!(session.detect().await.unwrap().len(), 2);
    assert_eq!(producer.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_concurrent_requests_share_one_session() {
    let session = Arc::new(ready_session().await);
    let mut handles = Vec::new();
    for _ in 0..4 {
        let session = Arc::clone(&session);
        handles.push(tokio::spawn(async move {
            let lenses = session.code_lens(Path::new(ETHER_PATH)).await.unwrap().unwrap();
            let findings = session.detect().await.unwrap().len();
            (lenses.len(), findings)
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), (12, 2));
    }
}

fn shift_one_line() -> ForwardChanges {
    let mut changes = ForwardChanges::new();
    changes.insert(0, 1);
    changes
}

#[tokio::test]
async fn test_edit_during_compilation_wins_over_its_output() {
    let producer = EtherProducer::default();
    let session = Arc::new(AnalysisSession::new(producer.clone(), AnalysisConfig::default()));
    session.recompile(&[ether_path()]).await.unwrap();
    let path = Path::new(ETHER_PATH);
    let before = session.code_lens(path).await.unwrap().unwrap();

    producer.gate.store(true, Ordering::SeqCst);
    let compile = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.recompile(&[ether_path()]).await }
    });
    producer.started.notified().await;

    // the compiler is reading the old text while the editor prepends a line
    session.file_changed(path, format!("\n{}", ETHER_TEXT), shift_one_line()).await;
    producer.release.notify_one();

    let failures = compile.await.unwrap().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].path, ether_path());
    assert!(matches!(failures[0].error, Error::Superseded(_)));
    assert!(session.live_files().await.is_empty());

    // the pending edit was kept, so cached lenses follow the new text
    let after = session.code_lens(path).await.unwrap().unwrap();
    assert_eq!(after.len(), before.len());
    for (old, new) in before.iter().zip(&after) {
        assert_eq!(new.command, old.command);
        assert_eq!(new.range.start.line, old.range.start.line + 1);
    }

    producer.gate.store(false, Ordering::SeqCst);
    assert!(session.recompile(&[ether_path()]).await.unwrap().is_empty());
    assert_eq!(session.live_files().await, vec![ether_path()]);
}

#[tokio::test]
async fn test_cancelled_recompile_does_not_block_requests() {
    let producer = EtherProducer::default();
    let session = AnalysisSession::new(producer.clone(), AnalysisConfig::default());
    session.recompile(&[ether_path()]).await.unwrap();

    producer.gate.store(true, Ordering::SeqCst);
    let cancelled = tokio::time::timeout(Duration::from_millis(50), session.recompile(&[ether_path()])).await;
    assert!(cancelled.is_err());

    let report = tokio::time::timeout(Duration::from_secs(5), session.detect())
        .await
        .expect("detect waited on a cancelled compilation")
        .unwrap();
    assert_eq!(report.len(), 2);
    let lenses = tokio::time::timeout(Duration::from_secs(5), session.code_lens(Path::new(ETHER_PATH)))
        .await
        .expect("code lens waited on a cancelled compilation")
        .unwrap();
    assert_eq!(lenses.unwrap().len(), 12);
}

#[tokio::test]
async fn test_closed_file_is_forgotten() {
    let producer = EtherProducer::default();
    let session = AnalysisSession::new(producer.clone(), AnalysisConfig::default());
    session.recompile(&[ether_path()]).await.unwrap();
    let path = Path::new(ETHER_PATH);
    session.code_lens(path).await.unwrap();

    session.file_changed(path, format!("\n{}", ETHER_TEXT), shift_one_line()).await;
    assert!(session.code_lens(path).await.unwrap().is_some());

    session.file_closed(path).await;
    assert!(session.code_lens(path).await.unwrap().is_none());

    session.recompile(&[ether_path()]).await.unwrap();
    let overlays = producer.overlays.lock().unwrap().clone();
    assert_eq!(overlays.len(), 2);
    assert!(overlays[1].is_empty());
    assert_eq!(session.code_lens(path).await.unwrap().unwrap().len(), 12);

    // closing a file without editor text leaves its IR alone
    session.file_closed(path).await;
    assert_eq!(session.live_files().await, vec![ether_path()]);
}

#[tokio::test]
async fn test_close_during_compilation_discards_its_output() {
    let producer = EtherProducer::default();
    let session = Arc::new(AnalysisSession::new(producer.clone(), AnalysisConfig::default()));
    let path = Path::new(ETHER_PATH);
    session.file_changed(path, ETHER_TEXT.to_string(), ForwardChanges::new()).await;

    producer.gate.store(true, Ordering::SeqCst);
    let compile = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.recompile(&[ether_path()]).await }
    });
    producer.started.notified().await;
    session.file_closed(path).await;
    producer.release.notify_one();

    let failures = compile.await.unwrap().unwrap();
    assert!(matches!(failures.as_slice(), [f] if matches!(f.error, Error::Superseded(_))));
    assert!(session.live_files().await.is_empty());
}
