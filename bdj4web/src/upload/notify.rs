//! Operator notification for received support messages

use std::process::Stdio;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::WebError;

/// A message for the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Support message relay: identifier first, then the client's text
    pub fn support_message(identifier: &str, content: &[u8]) -> Self {
        Self {
            subject: format!("BDJ4 support: {}", identifier),
            body: format!("{}\n\n{}", identifier, String::from_utf8_lossy(content)),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), WebError>;
}

/// Pipes an RFC 5322 message to a sendmail-compatible command
#[derive(Debug, Clone)]
pub struct SendmailNotifier {
    command: Vec<String>,
    from: String,
    to: String,
}

impl SendmailNotifier {
    pub fn new(command: Vec<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            command,
            from: from.into(),
            to: to.into(),
        }
    }

    fn render(&self, notification: &Notification) -> String {
        // no line breaks in headers
        let subject = notification.subject.replace(['\r', '\n'], " ");
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nDate: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}\r\n",
            self.from,
            self.to,
            subject,
            Utc::now().to_rfc2822(),
            notification.body
        )
    }
}

#[async_trait]
impl Notifier for SendmailNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), WebError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| WebError::ConfigError("empty sendmail command".to_string()))?;

        let message = self.render(notification);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(message.as_bytes()).await?;
        }
        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(WebError::NotifyError(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        debug!("Notification sent to {}", self.to);
        Ok(())
    }
}

/// Used when no operator address is configured
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), WebError> {
        info!(
            "No operator address configured, notification not sent: {}",
            notification.subject
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_support_message() {
        let n = Notification::support_message("abc123", b"player crashed");
        assert_eq!(n.subject, "BDJ4 support: abc123");
        assert!(n.body.starts_with("abc123\n\n"));
        assert!(n.body.ends_with("player crashed"));
    }

    #[test]
    fn test_render_headers() {
        let notifier = SendmailNotifier::new(vec![], "srv@example.org", "ops@example.org");
        let message = notifier.render(&Notification {
            subject: "a\r\nBcc: x".to_string(),
            body: "body".to_string(),
        });
        assert!(message.starts_with("From: srv@example.org\r\nTo: ops@example.org\r\n"));
        assert!(message.contains("Subject: a  Bcc: x\r\n"));
        assert!(message.ends_with("\r\n\r\nbody\r\n"));
    }

    #[tokio::test]
    async fn test_empty_command_is_config_error() {
        let notifier = SendmailNotifier::new(vec![], "a", "b");
        let err = notifier
            .notify(&Notification::support_message("x", b"y"))
            .await
            .unwrap_err();
        assert!(matches!(err, WebError::ConfigError(_)));
    }

    #[cfg(unix)]
    fn shell(script: String) -> SendmailNotifier {
        SendmailNotifier::new(
            vec!["sh".to_string(), "-c".to_string(), script],
            "srv@example.org",
            "ops@example.org",
        )
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_message_is_piped_to_command() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("mail.txt");
        let notifier = shell(format!("cat > '{}'", out.display()));

        notifier
            .notify(&Notification::support_message("abc", b"help"))
            .await
            .unwrap();
        let mail = std::fs::read_to_string(&out).unwrap();
        assert!(mail.contains("Subject: BDJ4 support: abc\r\n"));
        assert!(mail.ends_with("help\r\n"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command_is_notify_error() {
        let notifier = shell("cat > /dev/null; echo refused >&2; exit 3".to_string());
        let err = notifier
            .notify(&Notification::support_message("abc", b"help"))
            .await
            .unwrap_err();
        match err {
            WebError::NotifyError(message) => assert!(message.contains("refused")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timed_out_command_is_killed() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let notifier = shell(format!("echo $$ > '{}'; exec sleep 30", pid_file.display()));

        let result = tokio::time::timeout(
            Duration::from_millis(500),
            notifier.notify(&Notification::support_message("abc", b"help")),
        )
        .await;
        assert!(result.is_err());

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let stat = format!("/proc/{}/stat", pid.trim());
        let mut gone = false;
        for _ in 0..50 {
            gone = match std::fs::read_to_string(&stat) {
                Err(_) => true,
                // a killed but unreaped child shows as a zombie
                Ok(line) => line.rsplit(')').next().unwrap_or("").trim_start().starts_with('Z'),
            };
            if gone {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(gone, "mailer still running");
    }
}
