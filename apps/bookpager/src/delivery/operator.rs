//! Operator prompts: Enter to go on, `q` to stop.

use std::io::{self, BufRead};

use tokio::sync::mpsc;
use tracing::info;

use super::{DeliveryError, Trigger};

/// Reads Enter / `q` answers from the operator, one line per question.
///
/// Lines are read on a detached OS thread and handed over a channel. A read
/// still pending when the run ends never holds the runtime open.
pub struct OperatorPrompt {
    answers: tokio::sync::Mutex<mpsc::Receiver<io::Result<String>>>,
}

impl OperatorPrompt {
    pub fn stdin() -> io::Result<Self> {
        Self::from_reader(io::BufReader::new(io::stdin()))
    }

    pub fn from_reader<R>(reader: R) -> io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(1);
        std::thread::Builder::new()
            .name("operator-input".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
            })?;
        Ok(OperatorPrompt {
            answers: tokio::sync::Mutex::new(rx),
        })
    }

    /// Logs `question` and waits for one answer line. End of input counts as abort.
    pub async fn ask(&self, question: &str) -> Result<Trigger, DeliveryError> {
        info!("{question}");
        let mut answers = self.answers.lock().await;
        let answer = answers.recv().await.transpose()?;
        Ok(parse_answer(answer.as_deref()))
    }
}

fn parse_answer(answer: Option<&str>) -> Trigger {
    match answer.map(|a| a.trim().to_lowercase()) {
        None => Trigger::Abort,
        Some(a) if a == "q" || a == "quit" => Trigger::Abort,
        Some(_) => Trigger::Start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer(Some("")), Trigger::Start);
        assert_eq!(parse_answer(Some("  ")), Trigger::Start);
        assert_eq!(parse_answer(Some("q")), Trigger::Abort);
        assert_eq!(parse_answer(Some(" Quit ")), Trigger::Abort);
        assert_eq!(parse_answer(None), Trigger::Abort);
    }

    /// A reader whose first read blocks until the test lets it go.
    struct HeldOpen(std::sync::mpsc::Receiver<()>);

    impl io::Read for HeldOpen {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_prompt_reads_one_answer_per_question() {
        let prompt = OperatorPrompt::from_reader(io::Cursor::new(b"\n\nq\n".to_vec())).unwrap();
        assert_eq!(prompt.ask("start?").await.unwrap(), Trigger::Start);
        assert_eq!(prompt.ask("next?").await.unwrap(), Trigger::Start);
        assert_eq!(prompt.ask("next?").await.unwrap(), Trigger::Abort);
        // input exhausted
        assert_eq!(prompt.ask("next?").await.unwrap(), Trigger::Abort);
    }

    #[test]
    fn test_pending_question_does_not_hold_runtime_at_shutdown() {
        let (release, held) = std::sync::mpsc::channel();
        let prompt = OperatorPrompt::from_reader(io::BufReader::new(HeldOpen(held))).unwrap();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        let answered = runtime.block_on(async {
            tokio::select! {
                answer = prompt.ask("start?") => Some(answer),
                _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => None,
            }
        });
        assert!(answered.is_none());

        let start = std::time::Instant::now();
        drop(runtime);
        assert!(start.elapsed() < std::time::Duration::from_secs(2));

        release.send(()).unwrap();
    }
}
