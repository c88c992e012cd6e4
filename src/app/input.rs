// SPDX-License-Identifier: GPL-3.0-only

//! Key bindings of the kiosk
//!
//! Each binding is only live while its surface is on screen. While the
//! blocking alert is shown, any key dismisses it and nothing else happens.

use super::state::{Screen, SessionState};
use crate::filters::FilterId;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press asks the kiosk to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KioskAction {
    InsertCoin,
    Capture,
    SelectFilter(FilterId),
    Retake,
    Download,
    NewSession,
    DismissAlert,
    Quit,
}

/// Where the kiosk is when a key arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputContext {
    pub screen: Screen,
    pub state: SessionState,
    pub alert_visible: bool,
}

pub fn map_key(context: InputContext, key: KeyEvent) -> Option<KioskAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    // Operator exit
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(KioskAction::Quit);
    }

    if context.alert_visible {
        return Some(KioskAction::DismissAlert);
    }

    if key.code == KeyCode::Char('q') {
        return Some(KioskAction::Quit);
    }

    match context.screen {
        Screen::Coin => match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => Some(KioskAction::InsertCoin),
            _ => None,
        },
        Screen::Camera => match key.code {
            KeyCode::Char(c @ '1'..='8') => {
                FilterId::from_shortcut(c as u8 - b'0').map(KioskAction::SelectFilter)
            }
            KeyCode::Char(' ') if context.state == SessionState::CameraActive => {
                Some(KioskAction::Capture)
            }
            KeyCode::Char('r') if context.state == SessionState::Captured => {
                Some(KioskAction::Retake)
            }
            KeyCode::Char('d') if context.state == SessionState::Captured => {
                Some(KioskAction::Download)
            }
            KeyCode::Char('n') if context.state == SessionState::Captured => {
                Some(KioskAction::NewSession)
            }
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn context(screen: Screen, state: SessionState) -> InputContext {
        InputContext {
            screen,
            state,
            alert_visible: false,
        }
    }

    #[test]
    fn test_coin_screen() {
        let ctx = context(Screen::Coin, SessionState::Idle);
        assert_eq!(
            map_key(ctx, press(KeyCode::Char(' '))),
            Some(KioskAction::InsertCoin)
        );
        assert_eq!(
            map_key(ctx, press(KeyCode::Enter)),
            Some(KioskAction::InsertCoin)
        );
        // Filter keys belong to the camera screen
        assert_eq!(map_key(ctx, press(KeyCode::Char('3'))), None);
    }

    #[test]
    fn test_digits_select_filters_in_order() {
        let ctx = context(Screen::Camera, SessionState::CameraActive);
        for (digit, filter) in ('1'..='8').zip(FilterId::ALL) {
            assert_eq!(
                map_key(ctx, press(KeyCode::Char(digit))),
                Some(KioskAction::SelectFilter(filter))
            );
        }
        assert_eq!(map_key(ctx, press(KeyCode::Char('9'))), None);
    }

    #[test]
    fn test_capture_only_when_live() {
        let live = context(Screen::Camera, SessionState::CameraActive);
        assert_eq!(
            map_key(live, press(KeyCode::Char(' '))),
            Some(KioskAction::Capture)
        );

        let busy = context(Screen::Camera, SessionState::Capturing);
        assert_eq!(map_key(busy, press(KeyCode::Char(' '))), None);
    }

    #[test]
    fn test_still_actions() {
        let shown = context(Screen::Camera, SessionState::Captured);
        assert_eq!(
            map_key(shown, press(KeyCode::Char('r'))),
            Some(KioskAction::Retake)
        );
        assert_eq!(
            map_key(shown, press(KeyCode::Char('d'))),
            Some(KioskAction::Download)
        );
        assert_eq!(
            map_key(shown, press(KeyCode::Char('n'))),
            Some(KioskAction::NewSession)
        );

        let live = context(Screen::Camera, SessionState::CameraActive);
        assert_eq!(map_key(live, press(KeyCode::Char('d'))), None);
    }

    #[test]
    fn test_alert_swallows_keys() {
        let ctx = InputContext {
            screen: Screen::Coin,
            state: SessionState::Idle,
            alert_visible: true,
        };
        assert_eq!(
            map_key(ctx, press(KeyCode::Char(' '))),
            Some(KioskAction::DismissAlert)
        );
        assert_eq!(
            map_key(ctx, press(KeyCode::Char('q'))),
            Some(KioskAction::DismissAlert)
        );
        assert_eq!(
            map_key(ctx, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(KioskAction::Quit)
        );
    }

    #[test]
    fn test_release_events_ignored() {
        let mut key = press(KeyCode::Char(' '));
        key.kind = KeyEventKind::Release;
        assert_eq!(
            map_key(context(Screen::Coin, SessionState::Idle), key),
            None
        );
    }
}
