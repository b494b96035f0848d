use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Error)]
pub enum PromptError {
    /// The user dismissed the prompt without choosing anything.
    #[error("prompt cancelled")]
    Cancelled,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Interactive-input collaborator. `pick` presents labeled actions and
/// resolves to the index of the chosen one, `line` asks for free text.
/// Dismissing either resolves to [`PromptError::Cancelled`].
#[async_trait]
pub trait UserInput: Send + Sync {
    async fn pick(&self, message: &str, actions: &[String]) -> Result<usize, PromptError>;
    async fn line(&self, message: &str, default: Option<&str>) -> Result<String, PromptError>;
}

/// Terminal-backed input reading answers from stdin. An empty answer to a
/// `pick` dismisses it; an empty answer to a `line` takes the default.
pub struct ConsoleInput;

#[async_trait]
impl UserInput for ConsoleInput {
    async fn pick(&self, message: &str, actions: &[String]) -> Result<usize, PromptError> {
        println!("{message}");
        for (i, action) in actions.iter().enumerate() {
            println!("  {}) {}", i + 1, action);
        }
        let answer = read_line().await?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(PromptError::Cancelled);
        }
        // Accept the number or the action label itself.
        if let Ok(n) = answer.parse::<usize>()
            && (1..=actions.len()).contains(&n)
        {
            return Ok(n - 1);
        }
        actions
            .iter()
            .position(|a| a.eq_ignore_ascii_case(answer))
            .ok_or(PromptError::Cancelled)
    }

    async fn line(&self, message: &str, default: Option<&str>) -> Result<String, PromptError> {
        match default {
            Some(default) => println!("{message} [{default}]"),
            None => println!("{message}"),
        }
        let answer = read_line().await?;
        let answer = answer.trim();
        if answer.is_empty() {
            return match default {
                Some(default) => Ok(default.to_string()),
                None => Err(PromptError::Cancelled),
            };
        }
        Ok(answer.to_string())
    }
}

async fn read_line() -> Result<String, std::io::Error> {
    let mut line = String::new();
    // EOF leaves the line empty, which callers treat as a dismissal.
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line)
}
