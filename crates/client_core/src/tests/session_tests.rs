use super::*;
use shared::domain::LogKind;

fn appended(transition: &Transition) -> Vec<&LogLine> {
    transition
        .updates
        .iter()
        .filter_map(|update| match update {
            SessionUpdate::LogAppended(line) => Some(line),
            _ => None,
        })
        .collect()
}

fn running_machine() -> (SessionMachine, SessionId) {
    let mut machine = SessionMachine::new();
    let transition = machine.start();
    let Some(StreamCommand::Open(id)) = transition.commands.last().copied() else {
        panic!("start must open a stream: {:?}", transition.commands);
    };
    (machine, id)
}

#[test]
fn start_resets_log_and_flips_control() {
    let (mut machine, id) = running_machine();
    machine.on_message(id, "Processing playlist: mix...");

    let transition = machine.start();

    assert_eq!(machine.status(), SessionStatus::Running);
    assert_eq!(machine.control(), ActionControl::Stop);
    assert_eq!(machine.log().len(), 1);
    assert_eq!(machine.log().lines()[0].text(), START_REQUESTED_LINE);
    assert_eq!(machine.log().lines()[0].kind(), LogKind::System);
    assert!(transition.updates.contains(&SessionUpdate::LogCleared));
}

#[test]
fn restart_closes_previous_stream_before_opening_new_one() {
    let (mut machine, first) = running_machine();

    let transition = machine.start();

    let second = machine.active_session().expect("active session");
    assert_ne!(first, second);
    assert_eq!(
        transition.commands,
        vec![StreamCommand::Close(first), StreamCommand::Open(second)]
    );
}

#[test]
fn streamed_lines_are_appended_as_normal() {
    let (mut machine, id) = running_machine();

    let transition = machine.on_message(id, "Found 12 items in playlist.");

    let lines = appended(&transition);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].source(), LogKind::Normal);
    assert_eq!(lines[0].kind(), LogKind::Normal);
    assert!(transition.commands.is_empty());
}

#[test]
fn close_sentinel_completes_with_single_system_line() {
    let (mut machine, id) = running_machine();

    let transition = machine.on_message(id, "close");

    assert_eq!(machine.status(), SessionStatus::Idle);
    assert_eq!(transition.commands, vec![StreamCommand::Close(id)]);
    let lines = appended(&transition);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].text(), COMPLETED_LINE);
    assert_eq!(lines[0].kind(), LogKind::System);
    assert!(machine.active_session().is_none());
}

#[test]
fn termination_phrase_completes_without_logging_the_phrase() {
    let (mut machine, id) = running_machine();

    let transition = machine.on_message(id, "[시스템] 프로세스 종료 (Exit Code: 0)");

    assert_eq!(machine.status(), SessionStatus::Idle);
    let lines = appended(&transition);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].text(), COMPLETED_LINE);
    assert!(machine
        .log()
        .lines()
        .iter()
        .all(|line| !line.text().contains("Exit Code")));
}

#[test]
fn transport_error_after_close_is_suppressed() {
    let (mut machine, id) = running_machine();
    machine.on_message(id, "close");

    let transition = machine.on_transport_error(id);

    assert_eq!(transition, Transition::default());
    assert_eq!(machine.status(), SessionStatus::Idle);
    assert!(machine
        .log()
        .lines()
        .iter()
        .all(|line| line.kind() != LogKind::Error));
}

#[test]
fn transport_error_marks_errored_with_single_connection_lost_line() {
    let (mut machine, id) = running_machine();

    let transition = machine.on_transport_error(id);

    assert_eq!(machine.status(), SessionStatus::Errored);
    assert_eq!(machine.control(), ActionControl::Run { enabled: true });
    let lines = appended(&transition);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].text(), CONNECTION_LOST_LINE);
    assert_eq!(lines[0].kind(), LogKind::Error);
    assert!(machine
        .log()
        .lines()
        .iter()
        .all(|line| line.text() != COMPLETED_LINE));
}

#[test]
fn stale_stream_events_are_ignored() {
    let (mut machine, first) = running_machine();
    machine.start();

    assert_eq!(machine.on_message(first, "late line"), Transition::default());
    assert_eq!(machine.on_transport_error(first), Transition::default());
    assert_eq!(machine.status(), SessionStatus::Running);
    assert_eq!(machine.log().len(), 1);
}

#[test]
fn stop_response_forces_stopped_with_server_message() {
    let (mut machine, id) = running_machine();

    let transition = machine.on_stop_response("프로세스가 강제로 중지되었습니다.");

    assert_eq!(machine.status(), SessionStatus::Stopped);
    assert_eq!(machine.control(), ActionControl::Run { enabled: true });
    assert!(machine.active_session().is_none());
    assert_eq!(transition.commands, vec![StreamCommand::Close(id)]);
    let lines = appended(&transition);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].text(), "[시스템] 프로세스가 강제로 중지되었습니다.");
    assert_eq!(lines[0].source(), LogKind::Error);
}

#[test]
fn stop_failure_still_tears_down_without_log_line() {
    let (mut machine, id) = running_machine();

    let transition = machine.on_stop_failed();

    assert_eq!(machine.status(), SessionStatus::Stopped);
    assert_eq!(machine.control(), ActionControl::Run { enabled: true });
    assert!(machine.active_session().is_none());
    assert_eq!(transition.commands, vec![StreamCommand::Close(id)]);
    assert!(appended(&transition).is_empty());
}

#[test]
fn stop_while_idle_has_no_stream_to_close() {
    let mut machine = SessionMachine::new();

    let transition = machine.on_stop_response("실행 중인 프로세스가 없습니다.");

    assert!(transition.commands.is_empty());
    assert_eq!(machine.status(), SessionStatus::Stopped);
}
