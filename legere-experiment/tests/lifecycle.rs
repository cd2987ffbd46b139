mod common;

use common::{context, station, RecordingCamera, ScriptedInput, DISPLAY};
use legere_core::{Signal, TrialError, TrialKind, TrialPhase, ABORTED};
use legere_experiment::trials::{
    ComprehensionTrial, GazeCalibration, Instructions, Message, ReadingTrial, ResponseKeys,
    SubjectIdPage, YesNoQuestionTrial,
};
use legere_experiment::{Screen, Trial};
use legere_timing::ManualTimer;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn data_is_withheld_until_completion() {
    let timer = ManualTimer::new();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let (mut station, _) = station(ScriptedInput::new(&timer).at(0.5, Signal::Confirm));

    let mut page = Instructions::new("Welcome");
    assert!(matches!(page.get_data(), Err(TrialError::NotReady { .. })));
    assert!(matches!(
        page.deactivate(&mut ctx, &mut station),
        Err(TrialError::NotReady { .. })
    ));

    page.present(&mut ctx, &mut station, 0).unwrap();
    assert_eq!(page.phase(), TrialPhase::AwaitingEvent);
    assert!(matches!(page.get_data(), Err(TrialError::NotReady { .. })));

    page.handle_event(&mut ctx, &mut station).unwrap();
    assert_eq!(page.phase(), TrialPhase::Completed);
    let record = page.get_data().unwrap();
    assert_eq!(record.pno, Some(0));
    assert_eq!(record.trial_type, TrialKind::Instructions);
    assert_eq!(record.stimulus.as_deref(), Some("Welcome"));
    let (start, end) = (record.start_time.unwrap(), record.end_time.unwrap());
    assert!(end >= start);
    assert!((end - 0.5).abs() < 1e-9);
}

#[test]
fn a_trial_runs_only_once() {
    let timer = ManualTimer::new();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let (mut station, _) = station(
        ScriptedInput::new(&timer)
            .at(0.1, Signal::Confirm)
            .at(0.2, Signal::Confirm),
    );

    let mut page = Instructions::new("Once");
    page.activate(&mut ctx, &mut station, 3).unwrap();
    assert!(matches!(
        page.activate(&mut ctx, &mut station, 4),
        Err(TrialError::InvalidTransition { .. })
    ));
    assert_eq!(page.get_data().unwrap().pno, Some(3));
}

#[test]
fn events_are_handled_only_while_awaiting() {
    let timer = ManualTimer::new();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let input = ScriptedInput::new(&timer).at(0.1, Signal::Confirm);
    let polls = input.polls.clone();
    let (mut station, _) = station(input);

    let mut page = Instructions::new("Not yet");
    assert!(matches!(
        page.handle_event(&mut ctx, &mut station),
        Err(TrialError::NotReady { phase: TrialPhase::Inactive, .. })
    ));
    assert_eq!(polls.get(), 0);
    assert_eq!(page.phase(), TrialPhase::Inactive);

    page.activate(&mut ctx, &mut station, 0).unwrap();
    let used = polls.get();
    assert!(matches!(
        page.handle_event(&mut ctx, &mut station),
        Err(TrialError::NotReady { phase: TrialPhase::Completed, .. })
    ));
    assert_eq!(polls.get(), used);
}

#[test]
fn instructions_ignore_everything_but_the_space_bar() {
    let timer = ManualTimer::new();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let (mut station, screens) = station(
        ScriptedInput::new(&timer)
            .at(0.1, Signal::Key('x'))
            .at(0.2, Signal::Cancel)
            .at(0.3, Signal::Confirm),
    );

    let mut page = Instructions::consent("I agree\nto take part.");
    page.activate(&mut ctx, &mut station, 1).unwrap();
    let record = page.get_data().unwrap();
    assert_eq!(record.trial_type, TrialKind::ConsentForm);
    assert_eq!(record.response, None);
    assert!((record.end_time.unwrap() - 0.3).abs() < 1e-9);

    let log = screens.borrow();
    assert_eq!(
        log.screens[0],
        Screen::Text {
            lines: vec!["I agree".into(), "to take part.".into()],
            prompt: "Press space bar to consent.".into(),
        }
    );
    assert_eq!(log.hides, 1);
}

#[test]
fn close_aborts_the_session() {
    let timer = ManualTimer::new();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let (mut station, _) = station(ScriptedInput::new(&timer).at(0.2, Signal::Close));

    let mut page = Instructions::new("Welcome");
    let err = page.activate(&mut ctx, &mut station, 0).unwrap_err();
    assert!(err.is_session_abort());
    assert_eq!(page.phase(), TrialPhase::AwaitingEvent);
    assert!(page.get_data().is_err());
}

#[test]
fn message_has_no_end_time() {
    let timer = ManualTimer::new();
    timer.advance(std::time::Duration::from_millis(1500));
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let (mut station, screens) = station(ScriptedInput::new(&timer));

    let mut note = Message::new("Start of session");
    note.activate(&mut ctx, &mut station, 0).unwrap();
    let record = note.get_data().unwrap();
    assert_eq!(record.start_time, Some(0.0));
    assert_eq!(record.end_time, None);
    assert_eq!(record.metadata1.as_deref(), Some("Start of session"));
    assert!(screens.borrow().screens.is_empty());
}

#[test]
fn yes_no_question_records_canonical_answers() {
    let timer = ManualTimer::new();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let (mut station, _) = station(
        ScriptedInput::new(&timer)
            .at(0.1, Signal::Key('x'))
            .at(0.2, Signal::Confirm)
            .at(0.3, Signal::Key('J'))
            .at(0.4, Signal::Key('f')),
    );

    let mut first = YesNoQuestionTrial::new(7, "b", "Did Bill hunt?", ResponseKeys::default());
    first.activate(&mut ctx, &mut station, 5).unwrap();
    let record = first.get_data().unwrap();
    assert_eq!(record.response.as_deref(), Some("yes"));
    assert_eq!(record.item_id, Some(7));
    assert_eq!(record.condition.as_deref(), Some("b"));
    assert_eq!(record.stimulus.as_deref(), Some("Did Bill hunt?"));

    let mut second = YesNoQuestionTrial::new(8, "a", "Was it raining?", ResponseKeys::default());
    second.activate(&mut ctx, &mut station, 6).unwrap();
    assert_eq!(second.get_data().unwrap().response.as_deref(), Some("no"));
}

#[test]
fn custom_response_keys() {
    let timer = ManualTimer::new();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let (mut station, _) = station(
        ScriptedInput::new(&timer)
            .at(0.1, Signal::Key('j'))
            .at(0.2, Signal::Key('n')),
    );

    let keys = ResponseKeys { yes: 'y', no: 'n' };
    let mut question = YesNoQuestionTrial::new(1, "a", "Q?", keys);
    question.activate(&mut ctx, &mut station, 0).unwrap();
    let record = question.get_data().unwrap();
    assert_eq!(record.response.as_deref(), Some("no"));
    assert!((record.end_time.unwrap() - 0.2).abs() < 1e-9);
}

#[test]
fn comprehension_answers_by_side() {
    let timer = ManualTimer::new();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let (mut station, screens) = station(
        ScriptedInput::new(&timer)
            .at(0.1, Signal::Key('f'))
            .at(0.2, Signal::Key('j')),
    );
    let mut rng = StdRng::seed_from_u64(11);

    let mut left = ComprehensionTrial::new(2, "a", "Anna left.", "Did Anna stay?", ResponseKeys::default(), &mut rng);
    let mut right = ComprehensionTrial::new(3, "b", "Tom ate.", "Did Tom eat?", ResponseKeys::default(), &mut rng);
    left.activate(&mut ctx, &mut station, 0).unwrap();
    right.activate(&mut ctx, &mut station, 1).unwrap();

    let record = left.get_data().unwrap();
    assert_eq!(record.response.as_deref(), Some(left.options()[0]));
    assert_eq!(record.stimulus.as_deref(), Some("Anna left. : Did Anna stay?"));
    assert_eq!(record.metadata1, Some(left.options().join("|")));
    assert_eq!(right.get_data().unwrap().response.as_deref(), Some(right.options()[1]));

    let log = screens.borrow();
    match &log.screens[0] {
        Screen::Choice { options, .. } => {
            assert_eq!(options[0], left.options()[0]);
            assert_eq!(options[1], left.options()[1]);
        }
        other => panic!("unexpected screen {other:?}"),
    };
}

#[test]
fn subject_id_is_stored_as_entered() {
    let timer = ManualTimer::new();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let (mut station, _) = station(
        ScriptedInput::new(&timer)
            .at(0.1, Signal::Confirm)
            .at(0.5, Signal::Submit(" P-017 ".into())),
    );

    let mut page = SubjectIdPage::new();
    page.activate(&mut ctx, &mut station, 2).unwrap();
    let record = page.get_data().unwrap();
    assert_eq!(record.trial_type, TrialKind::SubjectIdPage);
    assert_eq!(record.response.as_deref(), Some(" P-017 "));
    assert_eq!(ctx.participant_id.as_deref(), Some(" P-017 "));
}

#[test]
fn reading_records_word_boxes() {
    let timer = ManualTimer::new();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let (mut station, screens) = station(ScriptedInput::new(&timer).at(2.0, Signal::Confirm));

    let mut trial = ReadingTrial::new(4, "a", "The cat sat.");
    trial.activate(&mut ctx, &mut station, 9).unwrap();

    let record = trial.get_data().unwrap();
    assert_eq!(record.response, None);
    assert!(record.start_time.unwrap() < 0.01);
    // the wait polls on 10 ms ticks that started after the blink
    let end = record.end_time.unwrap();
    assert!((2.0..2.01).contains(&end), "end {end}");

    let boxes = trial.word_boxes();
    assert_eq!(boxes.len(), 3);
    assert!(boxes.windows(2).all(|w| w[0].x1 <= w[1].x0));
    assert!(boxes.iter().all(|b| b.x1 <= DISPLAY.0));
    let aois = record.metadata1.unwrap();
    assert_eq!(aois.split(';').count(), 3);

    let log = screens.borrow();
    assert!(matches!(log.screens[0], Screen::Fixation { visible: true }));
    assert!(matches!(log.screens[1], Screen::Fixation { visible: false }));
    match log.screens.last() {
        Some(Screen::Reading { words, trigger }) => {
            let words: Vec<&str> = words.iter().map(|(w, _)| w.as_str()).collect();
            assert_eq!(words, vec!["The", "cat", "sat."]);
            assert_eq!(*trigger, None);
        }
        other => panic!("unexpected screen {other:?}"),
    };
}

#[test]
fn only_close_interrupts_the_fixation_blink() {
    let timer = ManualTimer::new();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let (mut blinking, _) = station(
        ScriptedInput::new(&timer)
            .at(0.3, Signal::Cancel)
            .at(0.4, Signal::Confirm)
            .at(2.0, Signal::Confirm),
    );
    let mut trial = ReadingTrial::new(4, "a", "The cat sat.");
    trial.activate(&mut ctx, &mut blinking, 0).unwrap();
    let record = trial.get_data().unwrap();
    assert_eq!(record.response, None);
    assert!(record.end_time.unwrap() >= 2.0);

    let (mut closing, _) = station(ScriptedInput::new(&timer).at(2.5, Signal::Close));
    let mut trial = ReadingTrial::new(5, "b", "The dog ran.");
    assert!(matches!(
        trial.activate(&mut ctx, &mut closing, 1),
        Err(TrialError::SessionAbort)
    ));
    assert!(ctx.now() < 3.1);
}

#[test]
fn escape_aborts_only_the_reading_page() {
    let timer = ManualTimer::new();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let (mut station, _) = station(ScriptedInput::new(&timer).at(2.0, Signal::Cancel));

    let mut trial = ReadingTrial::new(4, "a", "The cat sat.");
    trial.activate(&mut ctx, &mut station, 0).unwrap();
    let record = trial.get_data().unwrap();
    assert_eq!(record.response.as_deref(), Some(ABORTED));
    assert!(record.was_aborted());
}

#[test]
fn too_long_sentences_fail_after_the_grace_delay() {
    let timer = ManualTimer::new();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let (mut station, _) = station(ScriptedInput::new(&timer));

    let text = vec!["sentence"; 60].join(" ");
    let mut trial = ReadingTrial::new(1, "a", text);
    let err = trial.activate(&mut ctx, &mut station, 0).unwrap_err();
    match err {
        TrialError::LayoutOverflow { needed, available, .. } => {
            assert!(needed > available);
            assert_eq!(available, DISPLAY.0);
        }
        other => panic!("unexpected error {other:?}"),
    }
    // blink (~1 s) plus the grace delay
    assert!(ctx.now() >= 2.0);
    assert!(trial.get_data().is_err());
}

#[test]
fn calibration_stores_the_tracker_summary() {
    let timer = ManualTimer::new();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let (station, _) = station(ScriptedInput::new(&timer).at(0.3, Signal::Confirm));
    let tracker = common::FixedGaze::new(legere_experiment::GazeSample::new(0.0, 0.0, 0.0, 0.0));
    let tracker_log = tracker.log.clone();
    let mut station = station.with_tracker(Box::new(tracker));

    let mut calibration = GazeCalibration::new();
    calibration.activate(&mut ctx, &mut station, 3).unwrap();
    let record = calibration.get_data().unwrap();
    assert_eq!(record.metadata1.as_deref(), Some("9 points, error 0.4 deg"));
    assert_eq!(tracker_log.borrow().calibrations, 1);
}

#[test]
fn calibration_without_a_tracker_fails() {
    let timer = ManualTimer::new();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let (mut station, _) = station(ScriptedInput::new(&timer));

    let mut calibration = GazeCalibration::new();
    let err = calibration.activate(&mut ctx, &mut station, 0).unwrap_err();
    assert!(matches!(err, TrialError::Tracker(_)));
}

#[test]
fn experimental_trials_are_photographed() {
    let timer = ManualTimer::new();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let (station, _) = station(
        ScriptedInput::new(&timer)
            .at(0.1, Signal::Confirm)
            .at(0.2, Signal::Key('j')),
    );
    let camera = RecordingCamera::new(false);
    let shots = camera.shots.clone();
    let mut station = station.with_camera(Box::new(camera));

    let mut page = Instructions::new("Hello");
    page.activate(&mut ctx, &mut station, 0).unwrap();
    assert!(shots.borrow().is_empty());
    assert_eq!(page.get_data().unwrap().screenshot, None);

    let mut question = YesNoQuestionTrial::new(12, "c", "Q?", ResponseKeys::default());
    question.activate(&mut ctx, &mut station, 4).unwrap();
    let name = "20260101_120000_004_YesNoQuestionTrial_012_c.png";
    assert_eq!(question.get_data().unwrap().screenshot.as_deref(), Some(name));
    assert_eq!(*shots.borrow(), vec![dir.path().join(name)]);
}

#[test]
fn failed_screenshots_do_not_fail_the_trial() {
    let timer = ManualTimer::new();
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = context(&timer, dir.path());
    let (station, _) = station(ScriptedInput::new(&timer).at(0.1, Signal::Key('f')));
    let mut station = station.with_camera(Box::new(RecordingCamera::new(true)));

    let mut question = YesNoQuestionTrial::new(1, "a", "Q?", ResponseKeys::default());
    question.activate(&mut ctx, &mut station, 0).unwrap();
    let record = question.get_data().unwrap();
    assert_eq!(record.response.as_deref(), Some("no"));
    assert!(record.screenshot.is_some());
}
