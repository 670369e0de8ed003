//! Informational logging follows `Options::verbosity`.

use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};
use scenescope::*;

/// Records every message at info level or above.
struct Recorder {
    messages: Mutex<Vec<(Level, String)>>,
}

impl Log for Recorder {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.messages
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static RECORDER: Recorder = Recorder {
    messages: Mutex::new(Vec::new()),
};

fn take_info_messages() -> Vec<String> {
    std::mem::take(&mut *RECORDER.messages.lock().unwrap())
        .into_iter()
        .filter(|(level, _)| *level == Level::Info)
        .map(|(_, message)| message)
        .collect()
}

#[test]
fn test_verbosity_gates_info_messages() {
    log::set_logger(&RECORDER).unwrap();
    log::set_max_level(LevelFilter::Info);

    // Quiet session: lifecycle messages are suppressed
    let quiet = Options {
        verbosity: 0,
        ..Options::default()
    };
    let viewer = Scenescope::init_with_options(quiet).unwrap();
    viewer.shutdown();
    assert_eq!(take_info_messages(), Vec::<String>::new());

    // Default session: both are reported
    let viewer = Scenescope::init().unwrap();
    viewer.shutdown();
    let messages = take_info_messages();
    assert_eq!(messages.len(), 2, "{messages:?}");
    assert!(messages[0].contains("initialized"));
    assert!(messages[1].contains("shut down"));
}
