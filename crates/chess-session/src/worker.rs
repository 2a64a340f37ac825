//! Background engine thread for live play.

use chess_analysis::{AnalysisResult, EngineError, PositionAnalyzer};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Engine shared between the live worker and the analysis worker.
pub type SharedEngine = Arc<dyn PositionAnalyzer + Send + Sync>;

/// Ask for a move in the position reached by `moves`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    /// Game the request belongs to; bumped whenever the live game is replaced.
    pub generation: u64,
    /// Number of plies played when the request was issued.
    pub ply: usize,
    pub moves: Vec<String>,
    pub think_time: Duration,
}

#[derive(Debug)]
pub struct EngineReply {
    pub generation: u64,
    pub ply: usize,
    pub moves: Vec<String>,
    pub result: Result<AnalysisResult, EngineError>,
}

enum Job {
    Search(EngineRequest),
    NewGame,
}

/// One thread answering [`EngineRequest`]s in order.
pub struct EngineWorker {
    jobs: Option<Sender<Job>>,
    replies: Receiver<EngineReply>,
    handle: Option<JoinHandle<()>>,
}

impl EngineWorker {
    pub fn spawn(engine: SharedEngine) -> std::io::Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (reply_tx, reply_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("engine-worker".to_string())
            .spawn(move || {
                for job in job_rx {
                    let request = match job {
                        Job::Search(request) => request,
                        Job::NewGame => {
                            if let Err(e) = engine.new_game() {
                                warn!(error = %e, "engine did not accept a new game");
                            }
                            continue;
                        }
                    };
                    debug!(ply = request.ply, generation = request.generation, "engine request");
                    let result = engine.analyze(&request.moves, request.think_time);
                    let reply = EngineReply {
                        generation: request.generation,
                        ply: request.ply,
                        moves: request.moves,
                        result,
                    };
                    if reply_tx.send(reply).is_err() {
                        break;
                    }
                }
                info!("engine worker stopped");
            })?;

        Ok(Self {
            jobs: Some(job_tx),
            replies: reply_rx,
            handle: Some(handle),
        })
    }

    fn send(&self, job: Job) -> bool {
        self.jobs.as_ref().is_some_and(|tx| tx.send(job).is_ok())
    }

    /// Queue a request. Returns false once the worker has stopped.
    pub fn submit(&self, request: EngineRequest) -> bool {
        self.send(Job::Search(request))
    }

    /// Queue `ucinewgame` behind any search in flight.
    pub fn new_game(&self) -> bool {
        self.send(Job::NewGame)
    }

    pub fn try_recv(&self) -> Option<EngineReply> {
        match self.replies.try_recv() {
            Ok(reply) => Some(reply),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineReply> {
        match self.replies.recv_timeout(timeout) {
            Ok(reply) => Some(reply),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Stop accepting requests and wait for the in-flight one to finish.
    pub fn stop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for EngineWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Echo {
        new_games: AtomicUsize,
    }

    impl PositionAnalyzer for Echo {
        fn analyze(
            &self,
            moves: &[String],
            _think_time: Duration,
        ) -> Result<AnalysisResult, EngineError> {
            Ok(AnalysisResult {
                best_move: Some(format!("ply{}", moves.len())),
                ..AnalysisResult::default()
            })
        }

        fn new_game(&self) -> Result<(), EngineError> {
            self.new_games.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn request(generation: u64, ply: usize) -> EngineRequest {
        EngineRequest {
            generation,
            ply,
            moves: vec!["e2e4".to_string(); ply],
            think_time: Duration::from_millis(1),
        }
    }

    #[test]
    fn replies_come_back_in_order() {
        let worker = EngineWorker::spawn(Arc::new(Echo::default())).unwrap();
        for ply in 0..3 {
            assert!(worker.submit(request(7, ply)));
        }
        for ply in 0..3 {
            let reply = worker.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(reply.ply, ply);
            assert_eq!(reply.generation, 7);
            assert_eq!(reply.moves.len(), ply);
            assert_eq!(
                reply.result.unwrap().best_move,
                Some(format!("ply{}", ply))
            );
        }
    }

    #[test]
    fn new_game_runs_on_the_worker_without_a_reply() {
        let engine = Arc::new(Echo::default());
        let mut worker = EngineWorker::spawn(engine.clone()).unwrap();
        assert!(worker.new_game());
        assert!(worker.submit(request(1, 0)));

        let reply = worker.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(reply.generation, 1);
        worker.stop();
        assert_eq!(engine.new_games.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stopped_worker_rejects_requests() {
        let mut worker = EngineWorker::spawn(Arc::new(Echo::default())).unwrap();
        worker.stop();
        assert!(!worker.submit(request(0, 0)));
        assert!(!worker.new_game());
        assert!(worker.try_recv().is_none());
    }
}
