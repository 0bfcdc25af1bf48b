//! Sync session state machine.
//!
//! Every input is a pure transition: it mutates the machine and returns the
//! stream commands the driver must perform plus the UI updates it produced.
//! The machine never touches I/O, so the controller and the tests drive it
//! the same way.

use shared::{
    domain::{ActionControl, SessionId, SessionStatus},
    protocol::{PROCESS_TERMINATED_MARKER, RUN_CLOSE_SENTINEL},
};

use crate::log::{LogLine, SessionLog};

pub const START_REQUESTED_LINE: &str = "[시스템] 서버에 동기화 요청을 전송했습니다...";
pub const COMPLETED_LINE: &str = "[시스템] 작업이 완료되었습니다.";
pub const CONNECTION_LOST_LINE: &str = "[오류] 서버와의 연결이 끊어졌습니다.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCommand {
    Open(SessionId),
    Close(SessionId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    LogCleared,
    LogAppended(LogLine),
    StatusChanged(SessionStatus),
    ControlChanged(ActionControl),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Transition {
    pub commands: Vec<StreamCommand>,
    pub updates: Vec<SessionUpdate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
    Completed,
    Stopped,
    Lost,
}

impl Termination {
    fn status(self) -> SessionStatus {
        match self {
            Termination::Completed => SessionStatus::Idle,
            Termination::Stopped => SessionStatus::Stopped,
            Termination::Lost => SessionStatus::Errored,
        }
    }
}

pub fn is_close_sentinel(data: &str) -> bool {
    data == RUN_CLOSE_SENTINEL || data.contains(PROCESS_TERMINATED_MARKER)
}

#[derive(Debug, Default)]
pub struct SessionMachine {
    status: SessionStatus,
    control: ActionControl,
    active: Option<SessionId>,
    close_initiated: bool,
    next_id: u64,
    log: SessionLog,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn control(&self) -> ActionControl {
        self.control
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.active
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn start(&mut self) -> Transition {
        let mut transition = Transition::default();
        if let Some(previous) = self.active.take() {
            transition.commands.push(StreamCommand::Close(previous));
        }

        self.next_id += 1;
        let id = SessionId(self.next_id);
        self.active = Some(id);
        self.close_initiated = false;

        self.set_control(ActionControl::Stop, &mut transition);
        self.set_status(SessionStatus::Running, &mut transition);
        self.log.clear();
        transition.updates.push(SessionUpdate::LogCleared);
        self.append(LogLine::system(START_REQUESTED_LINE), &mut transition);

        transition.commands.push(StreamCommand::Open(id));
        transition
    }

    pub fn on_message(&mut self, id: SessionId, data: &str) -> Transition {
        let mut transition = Transition::default();
        if !self.accepts(id) {
            return transition;
        }

        if is_close_sentinel(data) {
            self.close_initiated = true;
            self.teardown(Termination::Completed, &mut transition);
        } else {
            self.append(LogLine::normal(data), &mut transition);
        }
        transition
    }

    pub fn on_transport_error(&mut self, id: SessionId) -> Transition {
        let mut transition = Transition::default();
        if !self.accepts(id) {
            return transition;
        }

        self.append(LogLine::error(CONNECTION_LOST_LINE), &mut transition);
        self.teardown(Termination::Lost, &mut transition);
        transition
    }

    /// The service acknowledged a stop request.
    pub fn on_stop_response(&mut self, message: &str) -> Transition {
        let mut transition = Transition::default();
        self.append(LogLine::error(format!("[시스템] {message}")), &mut transition);
        self.teardown(Termination::Stopped, &mut transition);
        transition
    }

    /// The stop request itself failed. The session is still forced down.
    pub fn on_stop_failed(&mut self) -> Transition {
        let mut transition = Transition::default();
        self.teardown(Termination::Stopped, &mut transition);
        transition
    }

    fn accepts(&self, id: SessionId) -> bool {
        self.active == Some(id) && !self.close_initiated
    }

    fn teardown(&mut self, termination: Termination, transition: &mut Transition) {
        if let Some(id) = self.active.take() {
            transition.commands.push(StreamCommand::Close(id));
        }
        self.set_control(ActionControl::Run { enabled: true }, transition);
        self.set_status(termination.status(), transition);
        if termination == Termination::Completed {
            self.append(LogLine::system(COMPLETED_LINE), transition);
        }
    }

    fn append(&mut self, line: LogLine, transition: &mut Transition) {
        self.log.push(line.clone());
        transition.updates.push(SessionUpdate::LogAppended(line));
    }

    fn set_status(&mut self, status: SessionStatus, transition: &mut Transition) {
        self.status = status;
        transition.updates.push(SessionUpdate::StatusChanged(status));
    }

    fn set_control(&mut self, control: ActionControl, transition: &mut Transition) {
        self.control = control;
        transition.updates.push(SessionUpdate::ControlChanged(control));
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
