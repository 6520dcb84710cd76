use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use mid_core::{QuitFlag, ResponseEvent, ResponseSource};
use mid_timing::{Clock, MonotonicClock};

/// Keyboard stand-in for the scanner button box: each stdin line is one
/// press, stamped on the session clock when it is read; `q` raises the quit
/// flag instead.
pub struct StdinResponses {
    rx: Receiver<ResponseEvent>,
}

impl StdinResponses {
    pub fn spawn(clock: MonotonicClock, quit: QuitFlag) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || listen(clock, quit, tx));
        Self { rx }
    }
}

fn listen(clock: MonotonicClock, quit: QuitFlag, tx: Sender<ResponseEvent>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("q") {
            quit.request();
            break;
        }
        if let Some(key) = trimmed.chars().next() {
            let event = ResponseEvent { key, at: clock.now() };
            if tx.send(event).is_err() {
                break;
            }
        }
    }
}

impl ResponseSource for StdinResponses {
    fn poll(&mut self) -> Option<ResponseEvent> {
        self.rx.try_recv().ok()
    }
}
