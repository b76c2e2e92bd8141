use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::matching::{MatchResult, ProgressEvent, TransferMode, UnmatchedReason};
use crate::domain::report::TransferReport;
use crate::domain::track::{Candidate, SourcePlaylist, SourceTrack};
use crate::services::error::{Result, TransferError};
use crate::services::providers::{
    DestinationPlaylistCreator, DestinationSearch, NoProgress, ProgressSink,
    SourcePlaylistProvider, UnmatchedLog,
};
use crate::services::query::build_query;
use crate::services::scorer::select_best;

pub const DEFAULT_LOG_PATH: &str = "noresults_youtube.txt";
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub skip_logging: bool,
    pub log_path: PathBuf,
    /// Pause between consecutive searches.
    pub search_delay: Duration,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            skip_logging: false,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            search_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub playlist_name: String,
    pub mode: TransferMode,
    pub results: Vec<MatchResult>,
    pub report: TransferReport,
    pub playlist_url: Option<String>,
    pub unmatched_log: Option<PathBuf>,
}

pub struct TransferService {
    source: Arc<dyn SourcePlaylistProvider>,
    search: Arc<dyn DestinationSearch>,
    creator: Arc<dyn DestinationPlaylistCreator>,
    progress: Arc<dyn ProgressSink>,
    unmatched_log: Option<Arc<dyn UnmatchedLog>>,
    rate_limit_backoff: Duration,
}

impl TransferService {
    pub fn new(
        source: Arc<dyn SourcePlaylistProvider>,
        search: Arc<dyn DestinationSearch>,
        creator: Arc<dyn DestinationPlaylistCreator>,
    ) -> Self {
        Self {
            source,
            search,
            creator,
            progress: Arc::new(NoProgress),
            unmatched_log: None,
            rate_limit_backoff: RATE_LIMIT_BACKOFF,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_unmatched_log(mut self, log: Arc<dyn UnmatchedLog>) -> Self {
        self.unmatched_log = Some(log);
        self
    }

    pub fn with_rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }

    /// Fetches the source playlist and runs it. Fetch failures are fatal.
    pub async fn transfer(
        &self,
        playlist_reference: &str,
        mode: TransferMode,
        options: &TransferOptions,
    ) -> Result<TransferOutcome> {
        let playlist = self.source.fetch(playlist_reference).await?;
        tracing::info!(
            "Fetched playlist \"{}\" with {} tracks",
            playlist.name,
            playlist.tracks.len()
        );
        self.run(&playlist, mode, options).await
    }

    /// Matches every track in order, then creates the destination playlist
    /// unless this is a dry run. Only the creation call can fail the run.
    pub async fn run(
        &self,
        playlist: &SourcePlaylist,
        mode: TransferMode,
        options: &TransferOptions,
    ) -> Result<TransferOutcome> {
        let total = playlist.tracks.len();
        let mut results = Vec::with_capacity(total);

        for (i, track) in playlist.tracks.iter().enumerate() {
            if i > 0 && !options.search_delay.is_zero() {
                tokio::time::sleep(options.search_delay).await;
            }

            results.push(self.match_track(track).await);

            let event = ProgressEvent::new(i + 1, total, track);
            if let Err(e) = self.progress.emit(&event) {
                tracing::warn!("Progress sink failed: {e}");
            }
        }

        let report = TransferReport::build(&results);
        tracing::info!(
            "Matched {}/{} tracks ({:.1}%)",
            report.matched,
            report.total,
            report.match_rate * 100.0
        );

        let unmatched_log = self.write_unmatched(&report, options).await;

        let playlist_url = match mode {
            TransferMode::DryRun => None,
            TransferMode::Create => {
                let ids: Vec<String> = results
                    .iter()
                    .filter_map(MatchResult::candidate)
                    .map(|c| c.id.clone())
                    .collect();
                if ids.is_empty() {
                    tracing::warn!("No tracks matched, skipping playlist creation");
                    None
                } else {
                    let url = self.creator.create(&playlist.name, &ids).await?;
                    tracing::info!("Created playlist {url}");
                    Some(url)
                }
            }
        };

        Ok(TransferOutcome {
            playlist_name: playlist.name.clone(),
            mode,
            results,
            report,
            playlist_url,
            unmatched_log,
        })
    }

    /// Search faults never escape: the track is recorded as having no
    /// candidates and the run moves on.
    pub async fn match_track(&self, track: &SourceTrack) -> MatchResult {
        let query = build_query(track);
        tracing::debug!("Searching: {query}");

        match self.search_with_retry(&query).await {
            Ok(candidates) => select_best(track, &candidates),
            Err(e) => {
                tracing::warn!("Search failed for \"{track}\": {e}");
                MatchResult::Unmatched {
                    source: track.clone(),
                    reason: UnmatchedReason::NoCandidates,
                }
            }
        }
    }

    async fn search_with_retry(&self, query: &str) -> Result<Vec<Candidate>> {
        match self.search.search(query).await {
            Err(TransferError::RateLimit(msg)) => {
                tracing::warn!(
                    "Rate limited ({msg}), retrying in {:?}",
                    self.rate_limit_backoff
                );
                tokio::time::sleep(self.rate_limit_backoff).await;
                self.search.search(query).await.map_err(|e| match e {
                    TransferError::RateLimit(msg) => TransferError::Transport(msg),
                    other => other,
                })
            }
            other => other,
        }
    }

    async fn write_unmatched(
        &self,
        report: &TransferReport,
        options: &TransferOptions,
    ) -> Option<PathBuf> {
        if options.skip_logging || report.unmatched_tracks.is_empty() {
            return None;
        }
        let log = self.unmatched_log.as_ref()?;
        match log.write(&report.unmatched_tracks, &options.log_path).await {
            Ok(()) => Some(options.log_path.clone()),
            Err(e) => {
                tracing::warn!(
                    "Failed to write unmatched tracks to {}: {e}",
                    options.log_path.display()
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    enum Reply {
        Hits(Vec<Candidate>),
        Transport,
        RateLimitedOnce(Vec<Candidate>),
        RateLimited,
    }

    #[derive(Default)]
    struct MockSearch {
        replies: HashMap<String, Reply>,
        queries: Mutex<Vec<String>>,
    }

    impl MockSearch {
        fn reply(mut self, query: &str, reply: Reply) -> Self {
            self.replies.insert(query.to_string(), reply);
            self
        }

        fn calls(&self, query: &str) -> usize {
            self.queries
                .lock()
                .unwrap()
                .iter()
                .filter(|q| q.as_str() == query)
                .count()
        }
    }

    #[async_trait]
    impl DestinationSearch for MockSearch {
        async fn search(&self, query: &str) -> Result<Vec<Candidate>> {
            let seen = {
                let mut queries = self.queries.lock().unwrap();
                queries.push(query.to_string());
                queries.iter().filter(|q| q.as_str() == query).count()
            };
            match self.replies.get(query) {
                None => Ok(Vec::new()),
                Some(Reply::Hits(hits)) => Ok(hits.clone()),
                Some(Reply::Transport) => Err(TransferError::Transport("connection reset".into())),
                Some(Reply::RateLimitedOnce(hits)) if seen > 1 => Ok(hits.clone()),
                Some(Reply::RateLimitedOnce(_)) | Some(Reply::RateLimited) => {
                    Err(TransferError::RateLimit("429".into()))
                }
            }
        }
    }

    #[derive(Default)]
    struct MockCreator {
        fail: bool,
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    #[async_trait]
    impl DestinationPlaylistCreator for MockCreator {
        async fn create(&self, title: &str, candidate_ids: &[String]) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((title.to_string(), candidate_ids.to_vec()));
            if self.fail {
                return Err(TransferError::Auth("missing token".into()));
            }
            Ok("https://music.youtube.com/playlist?list=PL123".to_string())
        }
    }

    struct MockSource(Option<SourcePlaylist>);

    #[async_trait]
    impl SourcePlaylistProvider for MockSource {
        async fn fetch(&self, playlist_reference: &str) -> Result<SourcePlaylist> {
            self.0
                .clone()
                .ok_or_else(|| TransferError::NotFound(playlist_reference.to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingProgress(Mutex<Vec<ProgressEvent>>);

    impl ProgressSink for RecordingProgress {
        fn emit(&self, event: &ProgressEvent) -> Result<()> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct BrokenProgress;

    impl ProgressSink for BrokenProgress {
        fn emit(&self, _event: &ProgressEvent) -> Result<()> {
            Err(TransferError::Io(std::io::Error::other("closed pipe")))
        }
    }

    #[derive(Default)]
    struct MemoryLog(Mutex<Vec<(PathBuf, Vec<SourceTrack>)>>);

    #[async_trait]
    impl UnmatchedLog for MemoryLog {
        async fn write(&self, tracks: &[SourceTrack], path: &Path) -> Result<()> {
            self.0
                .lock()
                .unwrap()
                .push((path.to_path_buf(), tracks.to_vec()));
            Ok(())
        }
    }

    fn track(n: usize) -> SourceTrack {
        SourceTrack::new(format!("Artist {n}"), format!("Song {n}"))
    }

    fn hit(n: usize) -> Candidate {
        Candidate {
            id: format!("vid{n}"),
            artist: format!("Artist {n}"),
            title: format!("Song {n}"),
            album: None,
            duration_seconds: None,
        }
    }

    fn query(n: usize) -> String {
        format!("Artist {n} Song {n}")
    }

    fn playlist(count: usize) -> SourcePlaylist {
        SourcePlaylist {
            name: "Road Trip".to_string(),
            tracks: (0..count).map(track).collect(),
        }
    }

    fn all_hits(count: usize) -> MockSearch {
        (0..count).fold(MockSearch::default(), |search, n| {
            search.reply(&query(n), Reply::Hits(vec![hit(n)]))
        })
    }

    fn service(search: Arc<MockSearch>, creator: Arc<MockCreator>) -> TransferService {
        TransferService::new(Arc::new(MockSource(Some(playlist(3)))), search, creator)
            .with_rate_limit_backoff(Duration::ZERO)
    }

    #[tokio::test]
    async fn full_match_reports_every_track_in_order() {
        let search = Arc::new(all_hits(28));
        let creator = Arc::new(MockCreator::default());
        let svc = service(search, creator);
        let source = playlist(28);

        let outcome = svc
            .run(&source, TransferMode::DryRun, &TransferOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 28);
        for (result, track) in outcome.results.iter().zip(&source.tracks) {
            assert_eq!(result.source(), track);
        }
        assert_eq!(outcome.report.total, 28);
        assert_eq!(outcome.report.matched, 28);
        assert_eq!(outcome.report.unmatched, 0);
        assert_eq!(outcome.report.match_rate, 1.0);
    }

    #[tokio::test]
    async fn dry_run_never_creates() {
        let search = Arc::new(all_hits(3));
        let creator = Arc::new(MockCreator::default());
        let svc = service(search, creator.clone());

        let outcome = svc
            .run(&playlist(3), TransferMode::DryRun, &TransferOptions::default())
            .await
            .unwrap();

        assert!(creator.calls.lock().unwrap().is_empty());
        assert!(outcome.playlist_url.is_none());
    }

    #[tokio::test]
    async fn create_sends_matched_ids_in_source_order() {
        let search = Arc::new(all_hits(3).reply(&query(1), Reply::Hits(Vec::new())));
        let creator = Arc::new(MockCreator::default());
        let svc = service(search, creator.clone());

        let outcome = svc
            .run(&playlist(3), TransferMode::Create, &TransferOptions::default())
            .await
            .unwrap();

        let calls = creator.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "Road Trip");
        assert_eq!(calls[0].1, vec!["vid0".to_string(), "vid2".to_string()]);
        assert_eq!(
            outcome.playlist_url.as_deref(),
            Some("https://music.youtube.com/playlist?list=PL123")
        );
    }

    #[tokio::test]
    async fn create_is_skipped_when_nothing_matched() {
        let search = Arc::new(MockSearch::default());
        let creator = Arc::new(MockCreator::default());
        let svc = service(search, creator.clone());

        let outcome = svc
            .run(&playlist(2), TransferMode::Create, &TransferOptions::default())
            .await
            .unwrap();

        assert!(creator.calls.lock().unwrap().is_empty());
        assert_eq!(outcome.report.unmatched, 2);
        assert!(outcome.playlist_url.is_none());
    }

    #[tokio::test]
    async fn creation_failure_is_fatal() {
        let search = Arc::new(all_hits(2));
        let creator = Arc::new(MockCreator {
            fail: true,
            ..Default::default()
        });
        let svc = service(search, creator);

        let err = svc
            .run(&playlist(2), TransferMode::Create, &TransferOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Auth(_)));
    }

    #[tokio::test]
    async fn transport_fault_degrades_single_track() {
        let search = Arc::new(all_hits(5).reply(&query(2), Reply::Transport));
        let creator = Arc::new(MockCreator::default());
        let svc = service(search, creator);

        let outcome = svc
            .run(&playlist(5), TransferMode::DryRun, &TransferOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.report.total, 5);
        assert_eq!(outcome.report.matched, 4);
        assert_eq!(outcome.report.unmatched_tracks, vec![track(2)]);
        assert_eq!(
            outcome.results[2],
            MatchResult::Unmatched {
                source: track(2),
                reason: UnmatchedReason::NoCandidates
            }
        );
    }

    #[tokio::test]
    async fn rate_limit_is_retried_once() {
        let search = Arc::new(
            all_hits(2)
                .reply(&query(0), Reply::RateLimitedOnce(vec![hit(0)]))
                .reply(&query(1), Reply::RateLimited),
        );
        let creator = Arc::new(MockCreator::default());
        let svc = service(search.clone(), creator);

        let outcome = svc
            .run(&playlist(2), TransferMode::DryRun, &TransferOptions::default())
            .await
            .unwrap();

        assert!(outcome.results[0].is_matched());
        assert!(!outcome.results[1].is_matched());
        assert_eq!(search.calls(&query(0)), 2);
        assert_eq!(search.calls(&query(1)), 2);
    }

    #[tokio::test]
    async fn progress_is_emitted_per_track_and_sink_errors_are_ignored() {
        let progress = Arc::new(RecordingProgress::default());
        let svc = service(Arc::new(all_hits(4)), Arc::new(MockCreator::default()))
            .with_progress(progress.clone());
        svc.run(&playlist(4), TransferMode::DryRun, &TransferOptions::default())
            .await
            .unwrap();

        let events = progress.0.lock().unwrap();
        let indices: Vec<_> = events.iter().map(|e| e.index).collect();
        assert_eq!(indices, [1, 2, 3, 4]);
        assert!(events.iter().all(|e| e.total == 4));
        assert_eq!(events[3].percent, 100.0);
        assert_eq!(events[0].display_label, "Artist 0 - Song 0");

        let svc = service(Arc::new(all_hits(2)), Arc::new(MockCreator::default()))
            .with_progress(Arc::new(BrokenProgress));
        let outcome = svc
            .run(&playlist(2), TransferMode::DryRun, &TransferOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.report.matched, 2);
    }

    #[tokio::test]
    async fn unmatched_tracks_are_logged_unless_skipped() {
        let log = Arc::new(MemoryLog::default());
        let search = Arc::new(all_hits(3).reply(&query(0), Reply::Hits(Vec::new())));
        let svc = service(search, Arc::new(MockCreator::default())).with_unmatched_log(log.clone());

        let options = TransferOptions {
            log_path: PathBuf::from("missing.txt"),
            ..Default::default()
        };
        let outcome = svc
            .run(&playlist(3), TransferMode::DryRun, &options)
            .await
            .unwrap();
        assert_eq!(outcome.unmatched_log, Some(PathBuf::from("missing.txt")));
        {
            let writes = log.0.lock().unwrap();
            assert_eq!(writes.len(), 1);
            assert_eq!(writes[0].1, vec![track(0)]);
        }

        let skip = TransferOptions {
            skip_logging: true,
            ..options
        };
        let outcome = svc.run(&playlist(3), TransferMode::DryRun, &skip).await.unwrap();
        assert!(outcome.unmatched_log.is_none());
        assert_eq!(log.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_is_surfaced() {
        let svc = TransferService::new(
            Arc::new(MockSource(None)),
            Arc::new(MockSearch::default()),
            Arc::new(MockCreator::default()),
        );
        let err = svc
            .transfer("nope", TransferMode::DryRun, &TransferOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::NotFound(_)));
    }

    #[tokio::test]
    async fn transfer_uses_source_playlist_name() {
        let creator = Arc::new(MockCreator::default());
        let svc = service(Arc::new(all_hits(3)), creator.clone());
        let outcome = svc
            .transfer("37i9dQZF1DXcBWIGoYBM5M", TransferMode::Create, &TransferOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome.playlist_name, "Road Trip");
        assert_eq!(creator.calls.lock().unwrap()[0].0, "Road Trip");
    }
}
