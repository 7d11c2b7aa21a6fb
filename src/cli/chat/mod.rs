pub mod controller;
pub mod conversation_state;
pub mod persona;
pub mod prompt;

use std::io::Write;
use std::process::ExitCode;

use chrono::{DateTime, Local};
use color_print::cformat;
use controller::ConversationController;
use conversation_state::ChatMessage;
use crossterm::cursor::MoveToColumn;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use eyre::Result;
use persona::DISPLAY_NAME;
use prompt::generate_prompt;
use tracing::{debug, warn};

use crate::config::Config;
use crate::pollinations_client::PollinationsClient;

const WELCOME_TEXT: &str = "
Sit with Kong Fuzi and ask what troubles you.

Things to try
• What is ren, and how do I cultivate it?
• How should a ruler govern his people?
• What does it mean to be a junzi?

/help         Show the help dialogue
/quit         Leave the conversation
";

const HELP_TEXT: &str = "
Confucius Chat

/clear        Start the conversation over
/dismiss      Hide the last error
/history      Show the conversation so far
/help         Show this help dialogue
/quit         Leave the conversation
";

pub struct ChatContext {
    output: Box<dyn Write>,
    input: Option<String>,
    interactive: bool,
    config: Config,
    controller: Option<ConversationController>,
}

impl ChatContext {
    pub fn new(output: Box<dyn Write>, input: Option<String>, interactive: bool, config: Config) -> Self {
        Self {
            output,
            input,
            interactive,
            config,
            controller: None,
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        if let Err(e) = self.connect() {
            writeln!(self.output, "Failed to initialize chat client: {:#}", e)?;
            return Ok(ExitCode::FAILURE);
        }

        // Single message, no greeting
        if let Some(input) = self.input.take() {
            let ok = self.process_chat_input(&input).await?;
            return Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE });
        }

        if self.interactive {
            self.print_welcome()?;
            self.run_interactive().await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    fn connect(&mut self) -> Result<()> {
        let client = PollinationsClient::new(&self.config)?;
        self.controller = Some(ConversationController::new(Box::new(client), &self.config.model));
        Ok(())
    }

    fn controller(&mut self) -> Result<&mut ConversationController> {
        self.controller
            .as_mut()
            .ok_or_else(|| eyre::eyre!("Chat client not initialized"))
    }

    fn print_welcome(&mut self) -> Result<()> {
        writeln!(self.output, "{}", WELCOME_TEXT)?;
        let greeting = self.controller()?.state().history()[0].clone();
        self.print_message(&greeting)?;
        Ok(())
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;
        let history_path = prompt::history_path();
        if let Some(path) = &history_path {
            if rl.load_history(path).is_err() {
                debug!("No readline history at {}", path.display());
            }
        }

        loop {
            let prompt_text = generate_prompt(None);
            let readline = rl.readline(&prompt_text);

            match readline {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    rl.add_history_entry(line.as_str());

                    if line.trim() == "/quit" {
                        break;
                    }

                    if let Err(e) = self.handle_input(&line).await {
                        writeln!(self.output, "Error: {}", e)?;
                    }
                }
                Err(e) => {
                    debug!("Leaving the chat loop: {}", e);
                    break;
                }
            }
        }

        if let Some(path) = &history_path {
            if let Some(dir) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(dir) {
                    warn!("Could not create {}: {}", dir.display(), e);
                }
            }
            if let Err(e) = rl.save_history(path) {
                warn!("Could not save readline history: {}", e);
            }
        }

        Ok(())
    }

    async fn handle_input(&mut self, input: &str) -> Result<()> {
        match input.trim() {
            "/help" => {
                writeln!(self.output, "{}", HELP_TEXT)?;
            }
            "/clear" => {
                self.controller()?.reset_conversation();
                writeln!(self.output, "Conversation cleared.")?;
                let greeting = self.controller()?.state().history()[0].clone();
                self.print_message(&greeting)?;
            }
            "/dismiss" => {
                self.controller()?.dismiss_error();
            }
            "/history" => {
                self.print_history()?;
            }
            _ => {
                self.process_chat_input(input).await?;
            }
        }

        Ok(())
    }

    /// Sends one message and prints the reply. Returns `false` when the
    /// request failed.
    async fn process_chat_input(&mut self, input: &str) -> Result<bool> {
        let show_indicator = self.interactive;
        let controller = self
            .controller
            .as_mut()
            .ok_or_else(|| eyre::eyre!("Chat client not initialized"))?;
        let output = &mut self.output;
        let before = controller.state().history().len();
        let mut updates = controller.subscribe();
        let mut indicator_shown = false;

        let indicator = async {
            if !show_indicator {
                return std::future::pending::<()>().await;
            }
            if updates.wait_for(|state| state.is_typing).await.is_ok() {
                let shown = write!(output, "{}", cformat!("<dim>{} is contemplating...</>", DISPLAY_NAME))
                    .and_then(|()| output.flush());
                match shown {
                    Ok(()) => indicator_shown = true,
                    Err(e) => debug!("Could not draw typing indicator: {}", e),
                }
            }
            std::future::pending::<()>().await
        };

        tokio::select! {
            _ = controller.send_message(input) => {}
            _ = indicator => {}
        }

        if indicator_shown {
            execute!(output, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        }

        let state = controller.state();
        if state.history().len() == before {
            // Blank input was ignored
            return Ok(true);
        }
        let reply = match state.history().last() {
            Some(message) => message.clone(),
            None => return Ok(true),
        };
        self.print_message(&reply)?;

        if let Some(err) = &state.last_error {
            warn!("Request failed: {}", err);
            writeln!(self.output, "{}", cformat!("<red>! {}</>", err))?;
            if self.interactive {
                writeln!(self.output, "{}", cformat!("<dim>(type /dismiss to hide)</>"))?;
            }
            return Ok(false);
        }

        Ok(true)
    }

    fn print_message(&mut self, message: &ChatMessage) -> Result<()> {
        if message.is_user {
            writeln!(self.output, "{}", cformat!("<green><bold>You:</></> {}", message.text))?;
        } else {
            writeln!(
                self.output,
                "{}\n",
                cformat!("<yellow><bold>{}:</></> {}", DISPLAY_NAME, message.text)
            )?;
        }
        Ok(())
    }

    fn print_history(&mut self) -> Result<()> {
        let state = self.controller()?.state();
        for message in state.history() {
            let speaker = if message.is_user { "You" } else { DISPLAY_NAME };
            writeln!(
                self.output,
                "{}",
                cformat!("<dim>[{}]</> <bold>{}:</> {}", format_timestamp(message.timestamp), speaker, message.text)
            )?;
        }
        if let Some(err) = &state.last_error {
            writeln!(self.output, "{}", cformat!("<red>! {}</>", err))?;
        }
        Ok(())
    }
}

fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|utc| utc.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}
