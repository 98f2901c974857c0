//! 端末での行単位のプロンプト

use async_trait::async_trait;
use azpool_core::{ProvisionError, Prompter, Result, Selection, cancellable};
use std::io::Write;
use tokio_util::sync::CancellationToken;

/// stdoutに質問し、stdinから回答を読む
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn select(
        &self,
        cancel: &CancellationToken,
        label: &str,
        candidates: &[String],
    ) -> Result<Selection> {
        let mut prompt = String::new();
        for (i, candidate) in candidates.iter().enumerate() {
            prompt.push_str(&format!("  [{}] {}\n", i + 1, candidate));
        }
        prompt.push_str(&format!("{}: ", label));

        let answer = ask(cancel, prompt).await?;
        Ok(interpret_choice(&answer, candidates))
    }

    async fn read_line(&self, cancel: &CancellationToken, label: &str) -> Result<String> {
        ask(cancel, format!("{}: ", label)).await
    }
}

/// 選択メニューへの回答を解釈
///
/// 範囲内の番号か候補名ならその候補、それ以外は新しい名前。
pub fn interpret_choice(answer: &str, candidates: &[String]) -> Selection {
    let answer = answer.trim();

    if let Ok(number) = answer.parse::<usize>() {
        if (1..=candidates.len()).contains(&number) {
            return Selection::Existing(candidates[number - 1].clone());
        }
    }

    match candidates.iter().find(|c| c.as_str() == answer) {
        Some(candidate) => Selection::Existing(candidate.clone()),
        None => Selection::New(answer.to_string()),
    }
}

async fn ask(cancel: &CancellationToken, prompt: String) -> Result<String> {
    if cancel.is_cancelled() {
        return Err(ProvisionError::Cancelled);
    }

    let read = tokio::task::spawn_blocking(move || -> std::io::Result<String> {
        print!("{}", prompt);
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    });

    match cancellable(cancel, read).await? {
        Ok(Ok(line)) => Ok(line),
        Ok(Err(e)) => Err(ProvisionError::Prompt(e.to_string())),
        Err(e) => Err(ProvisionError::Prompt(e.to_string())),
    }
}
