//! Kiosk screen flow over a [`DrawSession`].
//!
//! `Waiting -> Drawing -> Result -> Waiting`. The draw is committed when it
//! starts; `Drawing` only holds the prize back until the reveal. `Admin` is
//! entered and left from `Waiting` only.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::draw::RandomSource;
use crate::session::{DrawSession, Eligibility};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum KioskPhase {
    Waiting,
    /// Prize already drawn and recorded, not yet shown.
    Drawing { prize: String },
    Result { prize: String },
    Admin,
}

impl KioskPhase {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Drawing { .. } => "drawing",
            Self::Result { .. } => "result",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for KioskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("cannot {action} while {phase}")]
    WrongPhase {
        action: &'static str,
        phase: &'static str,
    },
    #[error("draw not allowed: {0}")]
    Ineligible(Eligibility),
}

/// Drives one kiosk screen.
#[derive(Debug)]
pub struct KioskFlow {
    session: DrawSession,
    phase: KioskPhase,
}

impl KioskFlow {
    #[must_use]
    pub const fn new(session: DrawSession) -> Self {
        Self {
            session,
            phase: KioskPhase::Waiting,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> &KioskPhase {
        &self.phase
    }

    #[must_use]
    pub const fn session(&self) -> &DrawSession {
        &self.session
    }

    #[must_use]
    pub fn into_session(self) -> DrawSession {
        self.session
    }

    fn require(&self, allowed: bool, action: &'static str) -> Result<(), FlowError> {
        if allowed {
            Ok(())
        } else {
            Err(FlowError::WrongPhase {
                action,
                phase: self.phase.name(),
            })
        }
    }

    /// Draw for a visitor with `visits` stamps.
    ///
    /// # Errors
    ///
    /// `WrongPhase` outside `Waiting`; `Ineligible` when the visitor may not
    /// draw. Neither touches the session.
    pub fn start_draw<R: RandomSource + ?Sized>(
        &mut self,
        visits: u32,
        rng: &mut R,
    ) -> Result<(), FlowError> {
        self.require(self.phase == KioskPhase::Waiting, "start a draw")?;
        let eligibility = self.session.eligibility(visits);
        if !eligibility.is_eligible() {
            return Err(FlowError::Ineligible(eligibility));
        }
        let prize = self.session.perform_draw(visits, rng);
        self.phase = KioskPhase::Drawing { prize };
        Ok(())
    }

    /// Show the drawn prize.
    ///
    /// # Errors
    ///
    /// `WrongPhase` unless `Drawing`.
    pub fn reveal(&mut self) -> Result<String, FlowError> {
        match std::mem::replace(&mut self.phase, KioskPhase::Waiting) {
            KioskPhase::Drawing { prize } => {
                self.phase = KioskPhase::Result {
                    prize: prize.clone(),
                };
                Ok(prize)
            }
            other => {
                let phase = other.name();
                self.phase = other;
                Err(FlowError::WrongPhase {
                    action: "reveal",
                    phase,
                })
            }
        }
    }

    /// Dismiss the result screen.
    ///
    /// # Errors
    ///
    /// `WrongPhase` unless `Result`.
    pub fn acknowledge(&mut self) -> Result<(), FlowError> {
        self.require(
            matches!(self.phase, KioskPhase::Result { .. }),
            "acknowledge",
        )?;
        self.phase = KioskPhase::Waiting;
        Ok(())
    }

    /// # Errors
    ///
    /// `WrongPhase` unless `Waiting`.
    pub fn enter_admin(&mut self) -> Result<(), FlowError> {
        self.require(self.phase == KioskPhase::Waiting, "enter admin")?;
        self.phase = KioskPhase::Admin;
        log::info!("admin mode entered");
        Ok(())
    }

    /// # Errors
    ///
    /// `WrongPhase` unless `Admin`.
    pub fn exit_admin(&mut self) -> Result<(), FlowError> {
        self.require(self.phase == KioskPhase::Admin, "exit admin")?;
        self.phase = KioskPhase::Waiting;
        log::info!("admin mode exited");
        Ok(())
    }

    /// Mutable session access for admin edits.
    ///
    /// # Errors
    ///
    /// `WrongPhase` unless `Admin`.
    pub fn admin(&mut self) -> Result<&mut DrawSession, FlowError> {
        self.require(self.phase == KioskPhase::Admin, "edit settings")?;
        Ok(&mut self.session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionOptions;
    use crate::draw::UnitSequence;
    use crate::session::SessionStores;

    fn flow() -> KioskFlow {
        KioskFlow::new(DrawSession::open(
            SessionOptions::default(),
            SessionStores::in_memory(),
        ))
    }

    #[test]
    fn full_cycle_returns_to_waiting() {
        let mut flow = flow();
        flow.start_draw(3, &mut UnitSequence::new([0.0])).unwrap();
        assert_eq!(flow.phase().name(), "drawing");
        assert_eq!(flow.reveal().unwrap(), "大当たり");
        assert_eq!(
            flow.phase(),
            &KioskPhase::Result {
                prize: "大当たり".into()
            }
        );
        flow.acknowledge().unwrap();
        assert_eq!(flow.phase(), &KioskPhase::Waiting);
        assert_eq!(flow.session().total_stock(), 549);
    }

    #[test]
    fn ineligible_visitor_is_refused_without_drawing() {
        let mut flow = flow();
        let err = flow.start_draw(1, &mut UnitSequence::new([0.0])).unwrap_err();
        assert_eq!(
            err,
            FlowError::Ineligible(Eligibility::NeedsVisits { remaining: 2 })
        );
        assert_eq!(flow.phase(), &KioskPhase::Waiting);
        assert_eq!(flow.session().total_stock(), 550);
    }

    #[test]
    fn out_of_order_actions_are_rejected() {
        let mut flow = flow();
        assert!(matches!(
            flow.acknowledge(),
            Err(FlowError::WrongPhase { phase: "waiting", .. })
        ));
        assert!(flow.reveal().is_err());
        assert!(flow.admin().is_err());

        flow.start_draw(3, &mut UnitSequence::new([0.5])).unwrap();
        assert!(flow.enter_admin().is_err());
        assert!(flow.start_draw(3, &mut UnitSequence::new([0.5])).is_err());
        assert_eq!(flow.session().total_stock(), 549);
    }

    #[test]
    fn admin_edits_only_inside_admin_mode() {
        let mut flow = flow();
        flow.enter_admin().unwrap();
        assert!(flow.start_draw(3, &mut UnitSequence::new([0.0])).is_err());
        flow.admin()
            .unwrap()
            .add_stock(&[("大当たり", 2)].into_iter().collect());
        flow.exit_admin().unwrap();
        assert_eq!(flow.session().total_stock(), 552);
        assert!(flow.exit_admin().is_err());
    }

    #[test]
    fn phase_serializes_with_tag() {
        let phase = KioskPhase::Result {
            prize: "はずれ".into(),
        };
        assert_eq!(
            serde_json::to_string(&phase).unwrap(),
            r#"{"phase":"result","prize":"はずれ"}"#
        );
        assert_eq!(
            serde_json::to_string(&KioskPhase::Waiting).unwrap(),
            r#"{"phase":"waiting"}"#
        );
    }

    #[test]
    fn error_messages_name_phase_and_reason() {
        let err = FlowError::WrongPhase {
            action: "reveal",
            phase: "waiting",
        };
        assert_eq!(err.to_string(), "cannot reveal while waiting");
        let err = FlowError::Ineligible(Eligibility::OutOfStock);
        assert_eq!(err.to_string(), "draw not allowed: 在庫がありません");
    }
}
