use async_trait::async_trait;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("Command executor is not running")]
    Stopped,

    #[error("Command executor dropped the response channel")]
    NoResponse,
}

/// A request that a [`CommandExecutor`] runs against its handler.
#[async_trait]
pub trait Command: Send + 'static {
    type Response: Send + 'static;
    type Handler: DeviceHandler<Command = Self>;

    async fn execute(self, handler: &mut Self::Handler) -> Self::Response;
}

pub trait DeviceHandler: Send + 'static {
    type Command: Command<Handler = Self>;
}

pub struct GenericCommand<C: Command> {
    command: C,
    response_ch: oneshot::Sender<C::Response>,
}

impl<C: Command> GenericCommand<C> {
    pub fn new(command: C, response_ch: oneshot::Sender<C::Response>) -> Self {
        Self {
            command,
            response_ch,
        }
    }

    pub async fn execute(self, handler: &mut C::Handler) -> Result<(), ExecutorError> {
        let result = self.command.execute(handler).await;

        self.response_ch
            .send(result)
            .map_err(|_| ExecutorError::NoResponse)
    }
}

/// Owns a handler and runs the commands it receives one at a time.
///
/// Every caller talks to the handler through a [`CommandSender`], so the
/// handler never sees two commands at once and needs no locking of its own.
pub struct CommandExecutor<H: DeviceHandler> {
    handler: H,
    commands_ch: mpsc::UnboundedReceiver<GenericCommand<H::Command>>,
    sender: mpsc::UnboundedSender<GenericCommand<H::Command>>,
}

impl<H: DeviceHandler> CommandExecutor<H> {
    pub fn new(handler: H) -> Self {
        let (sender, commands_ch) = mpsc::unbounded_channel();

        Self {
            handler,
            commands_ch,
            sender,
        }
    }

    pub fn sender(&self) -> CommandSender<H::Command> {
        CommandSender::new(self.sender.clone())
    }

    /// Runs until every [`CommandSender`] is dropped, then hands the handler back.
    pub async fn run(self) -> H {
        let Self {
            mut handler,
            mut commands_ch,
            sender,
        } = self;
        drop(sender);

        while let Some(command) = commands_ch.recv().await {
            if let Err(e) = command.execute(&mut handler).await {
                warn!("Command finished but its caller is gone: {}", e);
            }
        }

        debug!("All command senders dropped, stopping executor");
        handler
    }

    pub fn spawn(self) -> JoinHandle<H> {
        tokio::spawn(self.run())
    }
}

pub struct CommandSender<C: Command> {
    commands_ch: mpsc::UnboundedSender<GenericCommand<C>>,
}

impl<C: Command> Clone for CommandSender<C> {
    fn clone(&self) -> Self {
        Self {
            commands_ch: self.commands_ch.clone(),
        }
    }
}

impl<C: Command> CommandSender<C> {
    pub fn new(commands_ch: mpsc::UnboundedSender<GenericCommand<C>>) -> Self {
        Self { commands_ch }
    }

    pub async fn send_command(&self, command: C) -> Result<C::Response, ExecutorError> {
        let (response_ch, response_rx) = oneshot::channel();
        let command = GenericCommand::new(command, response_ch);

        self.commands_ch
            .send(command)
            .map_err(|_| ExecutorError::Stopped)?;

        response_rx.await.map_err(|_| ExecutorError::NoResponse)
    }
}
