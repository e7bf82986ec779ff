//! The interactive persona shell.

use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use ragdoll_application::{
    InputRewriter, Pacer, PersonaReply, PersonaSession, Providers, SessionOptions,
};
use ragdoll_core::cache::ResponseCache;
use ragdoll_core::messages;
use ragdoll_core::persona::PersonaConfig;
use ragdoll_core::prompt::PromptComposer;

use crate::helper::CliHelper;

/// Shorter inputs are ignored and the prompt repeats.
const MIN_INPUT_CHARS: usize = 3;

pub fn is_exit_command(input: &str) -> bool {
    let lower = input.trim().to_lowercase();
    lower == messages::BYE || lower == messages::EXIT
}

pub fn is_too_short(input: &str) -> bool {
    input.trim().chars().count() < MIN_INPUT_CHARS
}

pub struct Shell {
    config: PersonaConfig,
    providers: Providers,
    cache: ResponseCache,
    options: SessionOptions,
    rewriter: InputRewriter,
    session: Option<PersonaSession>,
}

impl Shell {
    pub fn new(
        config: PersonaConfig,
        providers: Providers,
        cache: ResponseCache,
        options: SessionOptions,
    ) -> Result<Self> {
        let composer = PromptComposer::new(config.templates.clone())?;
        let prefix = composer.compose_input_rewrite_prompt(&config.name)?;
        let rewriter = InputRewriter::new(
            providers.text.clone(),
            cache.with_enabled(cache.is_enabled() && config.cache),
            Arc::new(Pacer::new(options.delay)),
            prefix,
        );

        Ok(Self {
            config,
            providers,
            cache,
            options,
            rewriter,
            session: None,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        if self.config.greeting.is_some() {
            tracing::info!("{}", messages::CREATING_AGENT);
            let greeting = PersonaConfig {
                query: None,
                ..self.config.clone()
            };
            self.bootstrap(greeting).await;
        }

        let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
        rl.set_helper(Some(CliHelper::new()));
        let prompt = messages::prompt(&self.config.name);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let input = line.trim();
                    if is_too_short(input) {
                        continue;
                    }
                    if is_exit_command(input) {
                        println!("{}", messages::FAREWELL.bright_black());
                        break;
                    }
                    let _ = rl.add_history_entry(input);
                    self.ask(input).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!(
                        "{}",
                        format!(
                            "CTRL-C detected. Type '{}' or '{}' to quit.",
                            messages::BYE,
                            messages::EXIT
                        )
                        .yellow()
                    );
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", messages::FAREWELL.bright_black());
                    break;
                }
                Err(err) => {
                    eprintln!("{}", format!("Error: {:?}", err).red());
                    break;
                }
            }
        }

        Ok(())
    }

    async fn ask(&mut self, input: &str) {
        let question = self.rewriter.rewrite(input).await;

        match self.session.as_mut() {
            Some(session) => match session.chat(&question).await {
                Ok(reply) => print_reply(&reply),
                Err(e) => eprintln!("{}", e.to_string().red()),
            },
            None => {
                tracing::info!("{}", messages::CREATING_AGENT);
                let config = self.config.clone().with_query(question);
                self.bootstrap(config).await;
            }
        }
    }

    /// Starts a session; on failure the shell keeps running without one.
    async fn bootstrap(&mut self, config: PersonaConfig) {
        let started = PersonaSession::start(
            config,
            self.providers.clone(),
            self.cache.clone(),
            self.options.clone(),
        )
        .await;

        match started {
            Ok((session, reply)) => {
                print_reply(&reply);
                self.session = Some(session);
            }
            Err(e) => eprintln!("{}", e.to_string().red()),
        }
    }
}

fn print_reply(reply: &PersonaReply) {
    if let Some(image) = &reply.image {
        print!("{}", image);
    }
    for line in reply.text.lines() {
        println!("{}", line.bright_blue());
    }
    if reply.image.is_none() {
        for url in [&reply.image_url, &reply.image_url2].into_iter().flatten() {
            println!("{}", url.bright_black());
        }
    }
}
