/*!
 * Tests for the translation orchestrator: failover, retry, caching and order
 */

use parking_lot::Mutex;
use std::time::Duration;

use csvbridge::providers::mock::MockProvider;
use csvbridge::providers::TranslationBackend;
use csvbridge::translation::{
    LogObserver, ProgressObserver, ProgressUpdate, RetryPolicy, TranslationCache,
    TranslationContext, TranslationOrchestrator,
};

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn orchestrator(backends: Vec<Box<dyn TranslationBackend>>) -> TranslationOrchestrator {
    TranslationOrchestrator::new(backends, TranslationCache::new(true))
        .with_languages("zh-CN", "en")
        .with_retry(RetryPolicy {
            attempts: 2,
            delay: Duration::ZERO,
        })
}

async fn translate(orchestrator: &mut TranslationOrchestrator, input: &[String]) -> Vec<String> {
    orchestrator
        .translate_texts(input, &TranslationContext::default(), &LogObserver)
        .await
}

/// Observer keeping every update it receives
#[derive(Default)]
struct RecordingObserver {
    updates: Mutex<Vec<ProgressUpdate>>,
}

impl ProgressObserver for RecordingObserver {
    fn progress(&self, update: &ProgressUpdate) {
        self.updates.lock().push(update.clone());
    }
}

#[tokio::test]
async fn test_translateTexts_shouldPreserveLengthAndOrder() {
    let mut orchestrator = orchestrator(vec![Box::new(MockProvider::working())]);
    let input = texts(&["1", "你好", "Şehir", "世界", ""]);

    let output = translate(&mut orchestrator, &input).await;

    assert_eq!(
        output,
        texts(&["1", "[TRANSLATED to en] 你好", "Şehir", "[TRANSLATED to en] 世界", ""])
    );
}

#[tokio::test]
async fn test_translateTexts_withoutCjk_shouldNotCallBackend() {
    let mock = MockProvider::working();
    let mut orchestrator = orchestrator(vec![Box::new(mock.clone())]);

    let input = texts(&["id", "name", "Şehir"]);
    let output = translate(&mut orchestrator, &input).await;

    assert_eq!(output, input);
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn test_translateTexts_withFailingFirstBackend_shouldFailOverPerBatch() {
    let failing = MockProvider::failing().named("first");
    let working = MockProvider::working().named("second");
    let mut orchestrator = orchestrator(vec![Box::new(failing.clone()), Box::new(working.clone())]);

    let first = translate(&mut orchestrator, &texts(&["你好"])).await;
    assert_eq!(first, texts(&["[TRANSLATED to en] 你好"]));
    // two attempts on the failing backend before switching
    assert_eq!(failing.request_count(), 2);
    assert_eq!(working.request_count(), 1);

    // the next batch starts at the primary again
    let second = translate(&mut orchestrator, &texts(&["世界"])).await;
    assert_eq!(second, texts(&["[TRANSLATED to en] 世界"]));
    assert_eq!(failing.request_count(), 4);
    assert_eq!(working.request_count(), 2);
}

#[tokio::test]
async fn test_translateTexts_afterPrimaryRecovers_shouldUsePrimaryAgain() {
    // the primary fails its first two calls, then works
    let primary = MockProvider::recovering(2).named("primary");
    let secondary = MockProvider::working().named("secondary");
    let mut orchestrator = orchestrator(vec![Box::new(primary.clone()), Box::new(secondary.clone())]);

    translate(&mut orchestrator, &texts(&["你好"])).await;
    assert_eq!(secondary.request_count(), 1);

    let second = translate(&mut orchestrator, &texts(&["世界"])).await;

    assert_eq!(second, texts(&["[TRANSLATED to en] 世界"]));
    assert_eq!(primary.request_count(), 3);
    assert_eq!(secondary.request_count(), 1);
}

#[tokio::test]
async fn test_translateTexts_withEveryBackendFailing_shouldPassThroughOriginals() {
    let first = MockProvider::failing();
    let second = MockProvider::unavailable();
    let mut orchestrator = orchestrator(vec![Box::new(first.clone()), Box::new(second.clone())]);

    let input = texts(&["id", "你好"]);
    let output = translate(&mut orchestrator, &input).await;

    assert_eq!(output, input);
    assert_eq!(first.request_count(), 2);
    assert_eq!(second.request_count(), 1, "non-retryable errors skip the retries");
}

#[tokio::test]
async fn test_translateTexts_withNoBackends_shouldPassThrough() {
    let mut orchestrator = orchestrator(Vec::new());
    let input = texts(&["你好"]);
    assert_eq!(translate(&mut orchestrator, &input).await, input);
}

#[tokio::test]
async fn test_translateTexts_withWrongCount_shouldTreatAsFailure() {
    let short = MockProvider::wrong_count();
    let working = MockProvider::working();
    let mut orchestrator = orchestrator(vec![Box::new(short.clone()), Box::new(working.clone())]);

    let output = translate(&mut orchestrator, &texts(&["你好", "世界"])).await;

    assert_eq!(
        output,
        texts(&["[TRANSLATED to en] 你好", "[TRANSLATED to en] 世界"])
    );
    assert_eq!(short.request_count(), 2);
    assert_eq!(working.request_count(), 1);
}

#[tokio::test]
async fn test_translateTexts_withIntermittentBackend_shouldRecoverOnRetry() {
    // every second call fails
    let flaky = MockProvider::intermittent(2);
    let mut orchestrator = orchestrator(vec![Box::new(flaky.clone())]);

    let first = translate(&mut orchestrator, &texts(&["一"])).await;
    let second = translate(&mut orchestrator, &texts(&["二"])).await;

    assert_eq!(first, texts(&["[TRANSLATED to en] 一"]));
    assert_eq!(second, texts(&["[TRANSLATED to en] 二"]));
    assert_eq!(flaky.request_count(), 3);
}

#[tokio::test]
async fn test_translateTexts_withRepeatedText_shouldAnswerFromCache() {
    let mock = MockProvider::working();
    let mut orchestrator = orchestrator(vec![Box::new(mock.clone())]);

    let first = translate(&mut orchestrator, &texts(&["你好"])).await;
    let second = translate(&mut orchestrator, &texts(&["x", "你好"])).await;

    assert_eq!(second[1], first[0]);
    assert_eq!(mock.request_count(), 1);
    assert_eq!(orchestrator.cache().stats().hits, 1);
}

#[tokio::test]
async fn test_translateTexts_afterTotalFailure_shouldReuseCachedPassThrough() {
    let failing = MockProvider::failing();
    let mut orchestrator = orchestrator(vec![Box::new(failing.clone())]);

    translate(&mut orchestrator, &texts(&["你好"])).await;
    let again = translate(&mut orchestrator, &texts(&["你好"])).await;

    assert_eq!(again, texts(&["你好"]));
    assert_eq!(failing.request_count(), 2, "the cached pass-through is reused");
}

#[tokio::test]
async fn test_translateTexts_withSmallRequests_shouldChunkAndReportEachChunk() {
    let mock = MockProvider::working();
    let mut orchestrator =
        orchestrator(vec![Box::new(mock.clone())]).with_max_texts_per_request(2);
    let observer = RecordingObserver::default();
    let context = TranslationContext {
        file: "a.csv".to_string(),
        encoding: "GBK".to_string(),
        file_index: 1,
        total_files: 1,
        rows_done: 0,
        batch_rows: 5,
        rows_total: 5,
    };

    let input = texts(&["一", "二", "三", "四", "五"]);
    let output = orchestrator.translate_texts(&input, &context, &observer).await;

    assert_eq!(output.len(), 5);
    assert_eq!(mock.request_count(), 3);
    assert_eq!(mock.received_texts(), input);

    let updates = observer.updates.lock();
    let percents: Vec<u32> = updates.iter().map(|u| u.translation_percent).collect();
    assert_eq!(percents, vec![33, 66, 100]);
    assert_eq!(updates[2].total_percent, 100);
}

#[tokio::test]
async fn test_translateTexts_withRequestDelay_shouldSpaceCalls() {
    let mock = MockProvider::working();
    let mut orchestrator = orchestrator(vec![Box::new(mock.clone())])
        .with_max_texts_per_request(1)
        .with_request_delay(Duration::from_millis(40));

    let started = std::time::Instant::now();
    translate(&mut orchestrator, &texts(&["一", "二", "三"])).await;

    assert!(started.elapsed() >= Duration::from_millis(80));
}
