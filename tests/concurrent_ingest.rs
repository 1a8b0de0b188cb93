use std::sync::Arc;
use std::thread;

use mutascope::model::{FileId, OutcomeKind, RunRecorder};

const THREADS: usize = 8;
const LINES_PER_FILE: u32 = 50;

fn outcome_for(line: u32) -> OutcomeKind {
    match line % 4 {
        0 => OutcomeKind::Killed,
        1 => OutcomeKind::Survived,
        2 => OutcomeKind::NoCoverage,
        _ => OutcomeKind::TimedOut,
    }
}

#[test]
fn threads_on_distinct_files_produce_exact_scores() {
    let recorder = Arc::new(RunRecorder::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|worker| {
            let recorder = Arc::clone(&recorder);
            thread::spawn(move || {
                let package = format!("pkg.w{}", worker % 3);
                let file = FileId::new(format!("W{worker}.java"));
                for line in 0..LINES_PER_FILE {
                    for attempt in 0..2 {
                        recorder
                            .record(
                                &package,
                                file.clone(),
                                outcome_for(line),
                                i64::from(line),
                                format!("mutator {attempt}"),
                                "run",
                            )
                            .expect("record should be accepted");
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker should finish");
    }

    let recorder = Arc::try_unwrap(recorder).expect("all workers joined");
    assert_eq!(recorder.record_count(), THREADS * LINES_PER_FILE as usize * 2);
    let snapshot = recorder.seal();

    assert_eq!(snapshot.file_count(), THREADS);
    assert_eq!(snapshot.line_count(), THREADS * LINES_PER_FILE as usize);
    let score = snapshot.score();
    assert_eq!(score.total() as usize, THREADS * LINES_PER_FILE as usize);
    assert_eq!(score.killed as usize, THREADS * (LINES_PER_FILE as usize).div_ceil(4));
    assert_eq!(score.run_error, 0);
}

#[test]
fn threads_sharing_one_file_keep_every_record() {
    let recorder = Arc::new(RunRecorder::new());
    let file = FileId::new("Shared.java");

    thread::scope(|scope| {
        for worker in 0..THREADS {
            let recorder = &recorder;
            let file = file.clone();
            scope.spawn(move || {
                for line in 0..LINES_PER_FILE {
                    let outcome = if worker == 0 && line == 7 {
                        OutcomeKind::Survived
                    } else {
                        OutcomeKind::Killed
                    };
                    recorder
                        .record("shared", file.clone(), outcome, i64::from(line), "d", "m")
                        .expect("record should be accepted");
                }
            });
        }
    });

    let recorder = Arc::try_unwrap(recorder).expect("scope joined all workers");
    let snapshot = recorder.seal();
    assert_eq!(snapshot.line_count(), LINES_PER_FILE as usize);

    let line = snapshot.line("shared", &file, 7).expect("line 7 recorded");
    assert_eq!(line.records().len(), THREADS);
    assert_eq!(line.summary(), OutcomeKind::Survived);

    let score = snapshot.score();
    assert_eq!(score.survived, 1);
    assert_eq!(score.killed, LINES_PER_FILE - 1);
}
