//! Live SMTP mailbox probe. Speaks the minimum dialogue (HELO, MAIL FROM,
//! RCPT TO) against a mail exchanger to classify one address, without ever
//! sending mail. The protocol steps are an explicit state machine so the
//! classification logic is testable with no socket at all.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

pub const SMTP_PORT: u16 = 25;
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(8);

/// Point-in-time classification of a single address. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Valid,
    Invalid,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    AwaitGreeting,
    AwaitHeloAck,
    AwaitMailAck,
    AwaitRcptAck,
}

/// What to do after a server reply: write the next command and advance, or
/// stop with a final outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Send(String, ProbeState),
    Done(ProbeOutcome),
}

/// The commands of one probe conversation, bound to a candidate address.
#[derive(Debug, Clone)]
pub struct Dialogue {
    helo: String,
    mail_from: String,
    rcpt_to: String,
}

impl Dialogue {
    pub fn new(helo: &str, mail_from: &str, rcpt_to: &str) -> Self {
        Self {
            helo: helo.to_string(),
            mail_from: mail_from.to_string(),
            rcpt_to: rcpt_to.to_string(),
        }
    }

    /// Single dispatch per received reply code. Any non-matching code before
    /// the RCPT stage aborts with `Unknown`; only the RCPT reply can produce
    /// a definitive verdict.
    pub fn on_reply(&self, state: ProbeState, code: u16) -> Step {
        match state {
            ProbeState::AwaitGreeting => {
                if code == 220 {
                    Step::Send(format!("HELO {}", self.helo), ProbeState::AwaitHeloAck)
                } else {
                    Step::Done(ProbeOutcome::Unknown)
                }
            }
            ProbeState::AwaitHeloAck => {
                if code == 250 {
                    Step::Send(format!("MAIL FROM:<{}>", self.mail_from), ProbeState::AwaitMailAck)
                } else {
                    Step::Done(ProbeOutcome::Unknown)
                }
            }
            ProbeState::AwaitMailAck => {
                if code == 250 {
                    Step::Send(format!("RCPT TO:<{}>", self.rcpt_to), ProbeState::AwaitRcptAck)
                } else {
                    Step::Done(ProbeOutcome::Unknown)
                }
            }
            ProbeState::AwaitRcptAck => Step::Done(match code {
                250 | 251 => ProbeOutcome::Valid,
                550 | 551 | 553 => ProbeOutcome::Invalid,
                _ => ProbeOutcome::Unknown,
            }),
        }
    }
}

/// Drives a [`Dialogue`] over any line-oriented transport. A `QUIT` is always
/// attempted before returning; read or write failures yield `Unknown`.
pub async fn run_dialogue<S>(stream: S, dialogue: &Dialogue) -> ProbeOutcome
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut state = ProbeState::AwaitGreeting;

    loop {
        let code = match read_reply_code(&mut reader).await {
            Some(code) => code,
            None => {
                let _ = write_half.write_all(b"QUIT\r\n").await;
                return ProbeOutcome::Unknown;
            }
        };
        match dialogue.on_reply(state, code) {
            Step::Send(cmd, next) => {
                if write_half
                    .write_all(format!("{cmd}\r\n").as_bytes())
                    .await
                    .is_err()
                {
                    return ProbeOutcome::Unknown;
                }
                state = next;
            }
            Step::Done(outcome) => {
                let _ = write_half.write_all(b"QUIT\r\n").await;
                return outcome;
            }
        }
    }
}

/// Reads one SMTP reply group and returns its code. Continuation lines
/// ("250-…") are drained until the final line of the group.
async fn read_reply_code<R>(reader: &mut R) -> Option<u16>
where
    R: AsyncBufReadExt + Unpin,
{
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await.ok()?;
        if n == 0 {
            return None;
        }
        if line.len() >= 4 && line.as_bytes()[3] == b'-' {
            continue;
        }
        return line.get(..3)?.parse().ok();
    }
}

#[async_trait]
pub trait Probe: Send + Sync {
    async fn classify(&self, exchange: &str, address: &str) -> ProbeOutcome;
}

/// Real probe over a plaintext TCP connection to port 25. One attempt, no
/// retries; the 8-second deadline covers the whole conversation and dropping
/// the future closes the socket.
pub struct TcpProbe {
    helo: String,
    mail_from: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(helo: &str, mail_from: &str) -> Self {
        Self {
            helo: helo.to_string(),
            mail_from: mail_from.to_string(),
            port: SMTP_PORT,
            timeout: PROBE_TIMEOUT,
        }
    }

    #[cfg(test)]
    fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn classify(&self, exchange: &str, address: &str) -> ProbeOutcome {
        let dialogue = Dialogue::new(&self.helo, &self.mail_from, address);
        let attempt = async {
            match TcpStream::connect((exchange, self.port)).await {
                Ok(stream) => run_dialogue(stream, &dialogue).await,
                Err(e) => {
                    tracing::debug!(exchange = %exchange, error = %e, "probe connect failed");
                    ProbeOutcome::Unknown
                }
            }
        };
        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::debug!(exchange = %exchange, "probe timed out");
                ProbeOutcome::Unknown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialogue() -> Dialogue {
        Dialogue::new("probe.local", "verify@probe.local", "user@example.com")
    }

    #[test]
    fn happy_path_reaches_valid() {
        let d = dialogue();
        let step = d.on_reply(ProbeState::AwaitGreeting, 220);
        assert_eq!(
            step,
            Step::Send("HELO probe.local".into(), ProbeState::AwaitHeloAck)
        );
        let step = d.on_reply(ProbeState::AwaitHeloAck, 250);
        assert_eq!(
            step,
            Step::Send("MAIL FROM:<verify@probe.local>".into(), ProbeState::AwaitMailAck)
        );
        let step = d.on_reply(ProbeState::AwaitMailAck, 250);
        assert_eq!(
            step,
            Step::Send("RCPT TO:<user@example.com>".into(), ProbeState::AwaitRcptAck)
        );
        assert_eq!(
            d.on_reply(ProbeState::AwaitRcptAck, 250),
            Step::Done(ProbeOutcome::Valid)
        );
    }

    #[test]
    fn rcpt_reply_codes_classify() {
        let d = dialogue();
        for code in [250, 251] {
            assert_eq!(
                d.on_reply(ProbeState::AwaitRcptAck, code),
                Step::Done(ProbeOutcome::Valid)
            );
        }
        for code in [550, 551, 553] {
            assert_eq!(
                d.on_reply(ProbeState::AwaitRcptAck, code),
                Step::Done(ProbeOutcome::Invalid)
            );
        }
        for code in [450, 452, 421, 554] {
            assert_eq!(
                d.on_reply(ProbeState::AwaitRcptAck, code),
                Step::Done(ProbeOutcome::Unknown)
            );
        }
    }

    #[test]
    fn unexpected_code_before_rcpt_is_unknown() {
        let d = dialogue();
        assert_eq!(
            d.on_reply(ProbeState::AwaitGreeting, 554),
            Step::Done(ProbeOutcome::Unknown)
        );
        assert_eq!(
            d.on_reply(ProbeState::AwaitHeloAck, 502),
            Step::Done(ProbeOutcome::Unknown)
        );
        assert_eq!(
            d.on_reply(ProbeState::AwaitMailAck, 451),
            Step::Done(ProbeOutcome::Unknown)
        );
    }

    async fn scripted_session(replies: Vec<&'static str>) -> ProbeOutcome {
        let (client, server) = tokio::io::duplex(1024);
        let handle = tokio::spawn(async move {
            let (read_half, mut write_half) = tokio::io::split(server);
            let mut reader = BufReader::new(read_half);
            let mut replies = replies.into_iter();
            // Greeting goes out unprompted; each later reply answers a command.
            write_half
                .write_all(replies.next().unwrap().as_bytes())
                .await
                .unwrap();
            for reply in replies {
                let mut line = String::new();
                reader.read_line(&mut line).await.unwrap();
                write_half.write_all(reply.as_bytes()).await.unwrap();
            }
        });
        let outcome = run_dialogue(client, &dialogue()).await;
        handle.abort();
        outcome
    }

    #[tokio::test]
    async fn full_dialogue_over_stream_accepts() {
        let outcome = scripted_session(vec![
            "220 mx.example.com ESMTP\r\n",
            "250 mx.example.com\r\n",
            "250 2.1.0 Ok\r\n",
            "250 2.1.5 Ok\r\n",
        ])
        .await;
        assert_eq!(outcome, ProbeOutcome::Valid);
    }

    #[tokio::test]
    async fn multiline_replies_are_drained() {
        let outcome = scripted_session(vec![
            "220 mx.example.com ESMTP\r\n",
            "250-mx.example.com\r\n250-SIZE 35882577\r\n250 STARTTLS\r\n",
            "250 2.1.0 Ok\r\n",
            "550 5.1.1 User unknown\r\n",
        ])
        .await;
        assert_eq!(outcome, ProbeOutcome::Invalid);
    }

    #[tokio::test]
    async fn closed_stream_is_unknown() {
        let (client, server) = tokio::io::duplex(1024);
        drop(server);
        assert_eq!(run_dialogue(client, &dialogue()).await, ProbeOutcome::Unknown);
    }

    #[tokio::test]
    async fn connect_refused_is_unknown() {
        // Bind then drop a listener so the port is very likely closed.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let probe = TcpProbe::new("probe.local", "verify@probe.local").with_port(port);
        let outcome = probe.classify("127.0.0.1", "user@example.com").await;
        assert_eq!(outcome, ProbeOutcome::Unknown);
    }
}
