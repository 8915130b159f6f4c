use crossterm::event::{self, Event as CEvent, KeyEvent, KeyEventKind};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::error;

pub enum Event {
    Input(KeyEvent),
    Resize,
    Tick,
}

pub struct EventHandler {
    rx: mpsc::Receiver<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            if let Err(e) = Self::event_loop(tx, tick_rate) {
                error!(error = %e, "terminal event loop stopped");
            }
        });

        EventHandler { rx }
    }

    /// 事件循环处理函数，接收端关闭或读取终端失败时退出
    fn event_loop(tx: mpsc::Sender<Event>, tick_rate: Duration) -> std::io::Result<()> {
        let mut last_tick = Instant::now();

        loop {
            let timeout = Self::calculate_timeout(tick_rate, last_tick);

            // 处理终端事件
            if event::poll(timeout)? {
                if let Some(event) = Self::translate(event::read()?) {
                    if tx.send(event).is_err() {
                        return Ok(());
                    }
                }
            }

            // 处理定时器事件
            if last_tick.elapsed() >= tick_rate {
                if tx.send(Event::Tick).is_err() {
                    return Ok(());
                }
                last_tick = Instant::now();
            }
        }
    }

    /// 只保留按下事件，避免部分终端上一次按键触发两次
    fn translate(event: CEvent) -> Option<Event> {
        match event {
            CEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Input(key)),
            CEvent::Resize(_, _) => Some(Event::Resize),
            _ => None,
        }
    }

    /// 计算超时时间
    fn calculate_timeout(tick_rate: Duration, last_tick: Instant) -> Duration {
        tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0))
    }

    pub fn next(&self) -> Result<Event, mpsc::RecvError> {
        self.rx.recv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    #[test]
    fn test_translate_keeps_only_presses() {
        let press = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE);
        assert!(matches!(EventHandler::translate(CEvent::Key(press)), Some(Event::Input(_))));

        let release = KeyEvent {
            code: KeyCode::Char('s'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert!(EventHandler::translate(CEvent::Key(release)).is_none());

        assert!(matches!(EventHandler::translate(CEvent::Resize(80, 24)), Some(Event::Resize)));
        assert!(EventHandler::translate(CEvent::FocusGained).is_none());
    }

    #[test]
    fn test_calculate_timeout() {
        let tick_rate = Duration::from_millis(250);
        assert!(EventHandler::calculate_timeout(tick_rate, Instant::now()) <= tick_rate);
        let long_ago = Instant::now() - Duration::from_secs(1);
        assert_eq!(EventHandler::calculate_timeout(tick_rate, long_ago), Duration::ZERO);
    }
}
