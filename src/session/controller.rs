use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::ControllerConfig;
use super::machine::{Command, Effect, Event, SessionMachine};
use super::state::{InterviewSession, RecordedAnswer, SessionSnapshot};
use crate::capture::AnswerCapturePipeline;
use crate::error::{CommandRejected, GatewayError};
use crate::gateway::{CreateSessionRequest, DigitalHumanGateway, InterviewOutcome};
use crate::timer::SessionTimer;

/// Queue depth for presentation-layer commands
const COMMAND_BUFFER: usize = 16;

struct CommandEnvelope {
    command: Command,
    reply: oneshot::Sender<Result<(), CommandRejected>>,
}

/// Presentation-layer handle to a running interview.
///
/// Cloning is cheap. When the last clone is dropped the controller tears the
/// interview down exactly as `end()` would. Once the interview is completed
/// the controller stops: commands fail with `ControllerStopped` and the
/// state receiver reports the sender closed after the final snapshot.
#[derive(Clone)]
pub struct InterviewHandle {
    interview_id: String,
    commands: mpsc::Sender<CommandEnvelope>,
    state: watch::Receiver<SessionSnapshot>,
}

impl InterviewHandle {
    pub fn interview_id(&self) -> &str {
        &self.interview_id
    }

    /// Current state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.clone()
    }

    /// Candidate is ready to answer the current question
    pub async fn start_answer(&self) -> Result<(), CommandRejected> {
        self.send(Command::StartAnswer).await
    }

    /// Hand over a finished recording for `question_index`
    pub async fn submit_recording(
        &self,
        question_index: usize,
        recording: RecordedAnswer,
    ) -> Result<(), CommandRejected> {
        self.send(Command::SubmitRecording {
            question_index,
            recording,
        })
        .await
    }

    /// Re-attempt the operation behind a recoverable error
    pub async fn retry(&self) -> Result<(), CommandRejected> {
        self.send(Command::Retry).await
    }

    /// End the interview. Safe to call any number of times.
    pub async fn end(&self) -> Result<(), CommandRejected> {
        match self.send(Command::End).await {
            Err(CommandRejected::ControllerStopped) => Ok(()),
            other => other,
        }
    }

    async fn send(&self, command: Command) -> Result<(), CommandRejected> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(CommandEnvelope { command, reply })
            .await
            .map_err(|_| CommandRejected::ControllerStopped)?;
        rx.await.map_err(|_| CommandRejected::ControllerStopped)?
    }
}

/// Owns one interview's state machine and executes its effects.
///
/// All state mutations happen on the controller task, one command or
/// completion at a time. The task exits as soon as the state is terminal.
pub struct InterviewSessionController {
    interview_id: String,
    request: CreateSessionRequest,
    config: ControllerConfig,
    machine: SessionMachine,
    gateway: Arc<dyn DigitalHumanGateway>,
    pipeline: Arc<AnswerCapturePipeline>,
    timer: SessionTimer,
    /// Speech, grace and submission calls of the current epoch. Session
    /// creation is never tracked: a late session must still be released.
    in_flight: Vec<JoinHandle<()>>,
    commands: mpsc::Receiver<CommandEnvelope>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    state_tx: watch::Sender<SessionSnapshot>,
}

impl InterviewSessionController {
    /// Spawn a controller; it immediately starts creating the session
    pub fn spawn(
        request: CreateSessionRequest,
        config: ControllerConfig,
        gateway: Arc<dyn DigitalHumanGateway>,
        pipeline: Arc<AnswerCapturePipeline>,
    ) -> InterviewHandle {
        let interview_id = format!("interview-{}", uuid::Uuid::new_v4());
        let (commands_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionSnapshot::initial());

        let controller = Self {
            interview_id: interview_id.clone(),
            request,
            machine: SessionMachine::new(config.clone()),
            config,
            gateway,
            pipeline,
            timer: SessionTimer::new(),
            in_flight: Vec::new(),
            commands,
            events_tx,
            events_rx,
            state_tx,
        };

        tokio::spawn(controller.run());

        InterviewHandle {
            interview_id,
            commands: commands_tx,
            state: state_rx,
        }
    }

    async fn run(mut self) {
        info!(
            "Interview {} starting for role {} via {} gateway",
            self.interview_id,
            self.request.target_role,
            self.gateway.name()
        );

        let effects = self.machine.start();
        self.execute(effects);
        self.publish();

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(CommandEnvelope { command, reply }) => {
                        let name = command.name();
                        let result = match self.machine.handle_command(command) {
                            Ok(effects) => {
                                self.execute(effects);
                                Ok(())
                            }
                            Err(rejected) => {
                                debug!("Interview {}: {} rejected: {}", self.interview_id, name, rejected);
                                Err(rejected)
                            }
                        };
                        self.publish();
                        let _ = reply.send(result);
                    }
                    None => {
                        info!("Interview {}: all handles dropped, tearing down", self.interview_id);
                        let effects = self.machine.teardown();
                        self.execute(effects);
                        self.publish();
                        break;
                    }
                },
                Some(event) = self.events_rx.recv() => {
                    let effects = self.machine.handle_event(event);
                    self.execute(effects);
                    self.publish();
                }
            }

            if self.machine.state().is_terminal() {
                break;
            }
        }

        self.timer.cancel();
        self.abort_in_flight();
        self.commands.close();

        // Completions already queued may still carry a session to release;
        // anything sent after close() is released by its own task.
        self.events_rx.close();
        while let Ok(event) = self.events_rx.try_recv() {
            let effects = self.machine.handle_event(event);
            self.execute(effects);
        }

        info!("Interview {} controller stopped", self.interview_id);
    }

    fn publish(&self) {
        let next = self.machine.snapshot();
        self.state_tx.send_if_modified(|current| {
            if current.same_content(&next) {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn abort_in_flight(&mut self) {
        for task in self.in_flight.drain(..) {
            task.abort();
        }
    }

    fn track(&mut self, task: JoinHandle<()>) {
        self.in_flight.retain(|t| !t.is_finished());
        self.in_flight.push(task);
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::AbortInFlight => self.abort_in_flight(),

                Effect::CreateSession { epoch } => {
                    let gateway = Arc::clone(&self.gateway);
                    let request = self.request.clone();
                    let events = self.events_tx.clone();
                    let limit = self.config.connect_timeout;
                    let interview_id = self.interview_id.clone();
                    tokio::spawn(async move {
                        let result = bounded(limit, gateway.create_session(&request)).await;
                        if let Err(mpsc::error::SendError(Event::SessionCreated {
                            result: Ok(orphan),
                            ..
                        })) = events.send(Event::SessionCreated { epoch, result })
                        {
                            info!(
                                "Interview {}: releasing session {} created after teardown",
                                interview_id, orphan.id
                            );
                            release(gateway.as_ref(), &interview_id, &orphan).await;
                        }
                    });
                }

                Effect::Speak {
                    epoch,
                    avatar_session_id,
                    text,
                } => {
                    let gateway = Arc::clone(&self.gateway);
                    let events = self.events_tx.clone();
                    let limit = self.config.speech_timeout;
                    self.track(tokio::spawn(async move {
                        let result = bounded(limit, gateway.speak(&avatar_session_id, &text)).await;
                        let _ = events.send(Event::SpeechFinished { epoch, result });
                    }));
                }

                Effect::StartTimer { epoch, seconds } => {
                    let events = self.events_tx.clone();
                    self.timer.start(seconds, move |remaining| {
                        events.send(Event::Tick { epoch, remaining }).is_ok()
                    });
                }

                Effect::CancelTimer => self.timer.cancel(),

                Effect::ScheduleGrace { epoch, after } => {
                    let events = self.events_tx.clone();
                    self.track(tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        let _ = events.send(Event::GraceElapsed { epoch });
                    }));
                }

                Effect::Submit {
                    epoch,
                    session_id,
                    question_index,
                    submission,
                } => {
                    let pipeline = Arc::clone(&self.pipeline);
                    let events = self.events_tx.clone();
                    self.track(tokio::spawn(async move {
                        let result = pipeline
                            .submit(&session_id, question_index, submission)
                            .await;
                        let _ = events.send(Event::SubmissionFinished { epoch, result });
                    }));
                }

                Effect::Finalize {
                    session_id,
                    outcome,
                } => {
                    let gateway = Arc::clone(&self.gateway);
                    let interview_id = self.interview_id.clone();
                    tokio::spawn(async move {
                        finalize(gateway.as_ref(), &interview_id, &session_id, outcome).await;
                    });
                }

                Effect::EndSession { avatar_session_id } => {
                    // Never tracked: teardown must survive epoch changes
                    let gateway = Arc::clone(&self.gateway);
                    let interview_id = self.interview_id.clone();
                    tokio::spawn(async move {
                        if let Err(e) = gateway.end_session(&avatar_session_id).await {
                            warn!(
                                "Interview {}: failed to end session {}: {}",
                                interview_id, avatar_session_id, e
                            );
                        }
                    });
                }
            }
        }
    }
}

async fn finalize(
    gateway: &dyn DigitalHumanGateway,
    interview_id: &str,
    session_id: &str,
    outcome: InterviewOutcome,
) {
    if let Err(e) = gateway.finalize_session(session_id, outcome).await {
        warn!(
            "Interview {}: failed to finalize {} as {:?}: {}",
            interview_id, session_id, outcome, e
        );
    }
}

async fn release(
    gateway: &dyn DigitalHumanGateway,
    interview_id: &str,
    orphan: &InterviewSession,
) {
    if let Err(e) = gateway.end_session(&orphan.avatar_session_id).await {
        warn!(
            "Interview {}: failed to end session {}: {}",
            interview_id, orphan.avatar_session_id, e
        );
    }
    finalize(gateway, interview_id, &orphan.id, InterviewOutcome::Cancelled).await;
}

async fn bounded<T>(
    limit: Duration,
    call: impl std::future::Future<Output = Result<T, GatewayError>>,
) -> Result<T, GatewayError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(GatewayError::Timeout(limit.as_secs())),
    }
}
