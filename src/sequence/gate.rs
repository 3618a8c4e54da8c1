//! Named gates and what each one does.

use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::CalibError;

/// Every gate name a sequence may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gate {
    /// `I`: idle for the length of the shortest xy pulse.
    Identity,
    /// `IW`: idle for the configured wait length.
    IdleWait,
    /// `IWSE`: idle wait with a spin echo in the middle.
    EchoWait,
    /// `SE`: bare spin echo.
    SpinEcho,
    /// `IGN`: zero-length placeholder.
    Ignore,
    X,
    Y,
    HalfX,
    HalfY,
    MinusX,
    MinusY,
    MinusHalfX,
    MinusHalfY,
    Hadamard,
    /// `Z`: detuning pulse.
    Detune,
    ZPi,
    HalfZPi,
    Cz,
    Cnot,
}

/// Physical action behind a gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Wait(WaitKind),
    /// Resonant xy rotation by `angle` about an axis at `phase` in the xy-plane.
    Xy { angle: f64, phase: f64 },
    Hadamard,
    Detune,
    /// z rotation by `angle` via a flux pulse.
    Z { angle: f64 },
    /// Adiabatic conditional-phase pulse.
    ControlledPhase,
    Cnot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitKind {
    Identity,
    Idle,
    Echo,
    EchoOnly,
    Zero,
}

impl Gate {
    pub const ALL: [Gate; 19] = [
        Gate::Identity,
        Gate::IdleWait,
        Gate::EchoWait,
        Gate::SpinEcho,
        Gate::Ignore,
        Gate::X,
        Gate::Y,
        Gate::HalfX,
        Gate::HalfY,
        Gate::MinusX,
        Gate::MinusY,
        Gate::MinusHalfX,
        Gate::MinusHalfY,
        Gate::Hadamard,
        Gate::Detune,
        Gate::ZPi,
        Gate::HalfZPi,
        Gate::Cz,
        Gate::Cnot,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Gate::Identity => "I",
            Gate::IdleWait => "IW",
            Gate::EchoWait => "IWSE",
            Gate::SpinEcho => "SE",
            Gate::Ignore => "IGN",
            Gate::X => "X",
            Gate::Y => "Y",
            Gate::HalfX => "X/2",
            Gate::HalfY => "Y/2",
            Gate::MinusX => "-X",
            Gate::MinusY => "-Y",
            Gate::MinusHalfX => "-X/2",
            Gate::MinusHalfY => "-Y/2",
            Gate::Hadamard => "H",
            Gate::Detune => "Z",
            Gate::ZPi => "Zpi",
            Gate::HalfZPi => "Zpi/2",
            Gate::Cz => "CZ",
            Gate::Cnot => "CNOT",
        }
    }

    pub fn op(self) -> Op {
        match self {
            Gate::Identity => Op::Wait(WaitKind::Identity),
            Gate::IdleWait => Op::Wait(WaitKind::Idle),
            Gate::EchoWait => Op::Wait(WaitKind::Echo),
            Gate::SpinEcho => Op::Wait(WaitKind::EchoOnly),
            Gate::Ignore => Op::Wait(WaitKind::Zero),
            Gate::X => Op::Xy { angle: PI, phase: 0.0 },
            Gate::Y => Op::Xy { angle: PI, phase: FRAC_PI_2 },
            Gate::HalfX => Op::Xy { angle: FRAC_PI_2, phase: 0.0 },
            Gate::HalfY => Op::Xy { angle: FRAC_PI_2, phase: FRAC_PI_2 },
            Gate::MinusX => Op::Xy { angle: PI, phase: PI },
            Gate::MinusY => Op::Xy { angle: PI, phase: 3.0 * FRAC_PI_2 },
            Gate::MinusHalfX => Op::Xy { angle: FRAC_PI_2, phase: PI },
            Gate::MinusHalfY => Op::Xy { angle: FRAC_PI_2, phase: 3.0 * FRAC_PI_2 },
            Gate::Hadamard => Op::Hadamard,
            Gate::Detune => Op::Detune,
            Gate::ZPi => Op::Z { angle: PI },
            Gate::HalfZPi => Op::Z { angle: FRAC_PI_2 },
            Gate::Cz => Op::ControlledPhase,
            Gate::Cnot => Op::Cnot,
        }
    }

    /// Number of qubits the gate acts on.
    pub fn arity(self) -> usize {
        match self.op() {
            Op::ControlledPhase | Op::Cnot => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Gate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl FromStr for Gate {
    type Err = CalibError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Gate::ALL
            .iter()
            .copied()
            .find(|g| g.name() == s)
            .ok_or_else(|| CalibError::invalid(format!("Unknown gate: {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for gate in Gate::ALL {
            assert_eq!(gate.name().parse::<Gate>().unwrap(), gate);
        }
    }

    #[test]
    fn unknown_gate_is_rejected() {
        assert!("T".parse::<Gate>().is_err());
        assert!("x".parse::<Gate>().is_err());
    }

    #[test]
    fn rotation_axes() {
        assert_eq!("-Y/2".parse::<Gate>().unwrap().op(), Op::Xy {
            angle: FRAC_PI_2,
            phase: 3.0 * FRAC_PI_2
        });
        assert_eq!(Gate::Cz.arity(), 2);
        assert_eq!(Gate::HalfZPi.arity(), 1);
    }
}
