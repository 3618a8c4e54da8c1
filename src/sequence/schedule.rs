//! Explicit time bookkeeping for a small multi-qubit gate sequence.
//!
//! Each qubit carries a time cursor and a virtual-z (xy-phase) accumulator.
//! Gates are placed at the cursor and advance it; two-qubit gates first bring
//! both qubits to a common time. All times are in nanoseconds.

use serde::Serialize;
use tracing::debug;

use crate::domain::PulseSpec;
use crate::error::{CalibError, Result};
use crate::sequence::gate::{Gate, Op, WaitKind};

/// Per-qubit gate lengths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QubitTiming {
    pub pi_len: f64,
    pub pi_half_len: f64,
    /// Length of `I`; falls back to the shorter xy pulse when unset.
    pub identity_len: Option<f64>,
    pub idle_wait_len: f64,
    pub hadamard_len: f64,
    pub detune_len: f64,
    pub z_pi_len: f64,
    pub z_pi_half_len: f64,
}

impl Default for QubitTiming {
    fn default() -> Self {
        Self {
            pi_len: 20.0,
            pi_half_len: 20.0,
            identity_len: None,
            idle_wait_len: 10.0,
            hadamard_len: 40.0,
            detune_len: 10.0,
            z_pi_len: 10.0,
            z_pi_half_len: 10.0,
        }
    }
}

impl QubitTiming {
    fn duration(&self, gate: Gate) -> f64 {
        match gate.op() {
            Op::Wait(WaitKind::Identity) => self.identity_len.unwrap_or(self.pi_len.min(self.pi_half_len)),
            Op::Wait(WaitKind::Idle | WaitKind::Echo | WaitKind::EchoOnly) => self.idle_wait_len,
            Op::Wait(WaitKind::Zero) => 0.0,
            Op::Xy { angle, .. } => {
                if angle < std::f64::consts::PI {
                    self.pi_half_len
                } else {
                    self.pi_len
                }
            }
            Op::Hadamard => self.hadamard_len,
            Op::Detune => self.detune_len,
            Op::Z { angle } => {
                if angle < std::f64::consts::PI {
                    self.z_pi_half_len
                } else {
                    self.z_pi_len
                }
            }
            Op::ControlledPhase | Op::Cnot => 0.0,
        }
    }
}

/// Settings for the adiabatic CZ and the CNOT.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwoQubitTiming {
    /// Ramp template for the CZ; `start` is overwritten when placed and
    /// `return_trip` is forced on.
    pub cz_pulse: PulseSpec,
    /// Buffer on each side of the CZ pulse.
    pub cz_buffer: f64,
    /// Extra settling time after the CZ.
    pub cz_settle: f64,
    /// Single-qubit phase corrections applied after the CZ (control, target).
    pub cz_phases: (f64, f64),
    pub cnot_len: f64,
}

impl Default for TwoQubitTiming {
    fn default() -> Self {
        Self {
            cz_pulse: PulseSpec::default(),
            cz_buffer: 8.0,
            cz_settle: 30.0,
            cz_phases: (0.0, 0.0),
            cnot_len: 80.0,
        }
    }
}

impl TwoQubitTiming {
    /// Time a CZ occupies: `2·T + 2·buffer + settle`.
    pub fn cz_len(&self) -> f64 {
        2.0 * self.cz_pulse.duration + 2.0 * self.cz_buffer + self.cz_settle
    }
}

/// One placed gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledOp {
    pub gate: Gate,
    pub qubits: Vec<usize>,
    pub start: f64,
    pub duration: f64,
    /// Drive phase of an xy pulse including the accumulated virtual-z frame.
    pub drive_phase: Option<f64>,
    /// Flux pulse placed on the control qubit by a CZ.
    pub pulse: Option<PulseSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct QubitState {
    cursor: f64,
    xy_phase: f64,
}

/// Builds a schedule gate by gate.
#[derive(Debug, Clone)]
pub struct ScheduleBuilder {
    timings: Vec<QubitTiming>,
    two_qubit: TwoQubitTiming,
    states: Vec<QubitState>,
    ops: Vec<ScheduledOp>,
}

/// Finished schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule {
    pub ops: Vec<ScheduledOp>,
    /// Final time cursor per qubit.
    pub end_times: Vec<f64>,
    /// Accumulated virtual-z phase per qubit.
    pub xy_phases: Vec<f64>,
}

impl Schedule {
    pub fn duration(&self) -> f64 {
        self.end_times.iter().copied().fold(0.0, f64::max)
    }
}

impl ScheduleBuilder {
    pub fn new(timings: Vec<QubitTiming>, two_qubit: TwoQubitTiming) -> Self {
        let states = vec![QubitState::default(); timings.len()];
        Self {
            timings,
            two_qubit,
            states,
            ops: Vec::new(),
        }
    }

    pub fn num_qubits(&self) -> usize {
        self.states.len()
    }

    pub fn cursor(&self, qubit: usize) -> Option<f64> {
        self.states.get(qubit).map(|s| s.cursor)
    }

    pub fn xy_phase(&self, qubit: usize) -> Option<f64> {
        self.states.get(qubit).map(|s| s.xy_phase)
    }

    /// Bring the given qubits to their latest cursor.
    pub fn sync(&mut self, qubits: &[usize]) -> Result<()> {
        self.check_qubits(qubits)?;
        let latest = qubits.iter().map(|&q| self.states[q].cursor).fold(f64::MIN, f64::max);
        for &q in qubits {
            self.states[q].cursor = latest;
        }
        Ok(())
    }

    pub fn sync_all(&mut self) {
        let latest = self.states.iter().map(|s| s.cursor).fold(0.0, f64::max);
        for s in &mut self.states {
            s.cursor = latest;
        }
    }

    /// Place `gate` on `qubits` (control first for two-qubit gates).
    pub fn apply(&mut self, gate: Gate, qubits: &[usize]) -> Result<()> {
        if qubits.len() != gate.arity() {
            return Err(CalibError::invalid(format!(
                "{gate} acts on {} qubit(s), got {}",
                gate.arity(),
                qubits.len()
            )));
        }
        self.check_qubits(qubits)?;

        match gate.op() {
            Op::ControlledPhase => self.place_cz(qubits[0], qubits[1]),
            Op::Cnot => {
                self.sync(qubits)?;
                let start = self.states[qubits[0]].cursor;
                let duration = self.two_qubit.cnot_len;
                self.push(gate, qubits, start, duration, None, None);
                for &q in qubits {
                    self.states[q].cursor += duration;
                }
            }
            op => {
                let q = qubits[0];
                let start = self.states[q].cursor;
                let duration = self.timings[q].duration(gate);
                let drive_phase = match op {
                    Op::Xy { phase, .. } => Some(phase + self.states[q].xy_phase),
                    _ => None,
                };
                self.push(gate, qubits, start, duration, drive_phase, None);
                self.states[q].cursor += duration;
            }
        }
        Ok(())
    }

    /// Apply one layer: either a single two-qubit gate on qubits `(0, 1)`,
    /// or one single-qubit gate per qubit. Layers are synchronized afterwards.
    pub fn apply_layer(&mut self, layer: &[Gate]) -> Result<()> {
        match layer {
            [gate] if gate.arity() == 2 => {
                self.sync_all();
                self.apply(*gate, &[0, 1])?;
            }
            gates => {
                if gates.len() != self.num_qubits() {
                    return Err(CalibError::invalid(format!(
                        "layer has {} gate(s) for {} qubit(s)",
                        gates.len(),
                        self.num_qubits()
                    )));
                }
                for (q, &gate) in gates.iter().enumerate() {
                    self.apply(gate, &[q])?;
                }
            }
        }
        self.sync_all();
        Ok(())
    }

    pub fn finish(self) -> Schedule {
        Schedule {
            end_times: self.states.iter().map(|s| s.cursor).collect(),
            xy_phases: self.states.iter().map(|s| s.xy_phase).collect(),
            ops: self.ops,
        }
    }

    fn place_cz(&mut self, control: usize, target: usize) {
        let latest = self.states[control].cursor.max(self.states[target].cursor);
        let length = self.two_qubit.cz_len();
        let pulse = PulseSpec {
            start: latest + self.two_qubit.cz_buffer,
            return_trip: true,
            ..self.two_qubit.cz_pulse
        };
        debug!(control, target, start = latest, length, "placing CZ");
        self.push(Gate::Cz, &[control, target], latest, length, None, Some(pulse));

        let (phase0, phase1) = self.two_qubit.cz_phases;
        self.states[control].cursor = latest + length;
        self.states[target].cursor = latest + length;
        self.states[control].xy_phase += phase0;
        self.states[target].xy_phase += phase1;
    }

    fn push(
        &mut self,
        gate: Gate,
        qubits: &[usize],
        start: f64,
        duration: f64,
        drive_phase: Option<f64>,
        pulse: Option<PulseSpec>,
    ) {
        self.ops.push(ScheduledOp {
            gate,
            qubits: qubits.to_vec(),
            start,
            duration,
            drive_phase,
            pulse,
        });
    }

    fn check_qubits(&self, qubits: &[usize]) -> Result<()> {
        let n = self.num_qubits();
        if let Some(&q) = qubits.iter().find(|&&q| q >= n) {
            return Err(CalibError::invalid(format!("qubit index {q} out of range (have {n})")));
        }
        if qubits.len() == 2 && qubits[0] == qubits[1] {
            return Err(CalibError::invalid("two-qubit gate needs distinct qubits"));
        }
        Ok(())
    }
}

/// Parse `"X,I; CZ; Y/2,-X"` into layers: `;` separates layers, `,` separates
/// the per-qubit gates inside a layer.
pub fn parse_layers(text: &str) -> Result<Vec<Vec<Gate>>> {
    text.split(';')
        .map(str::trim)
        .filter(|layer| !layer.is_empty())
        .map(|layer| layer.split(',').map(str::parse::<Gate>).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn builder() -> ScheduleBuilder {
        ScheduleBuilder::new(vec![QubitTiming::default(); 2], TwoQubitTiming {
            cz_phases: (0.3, -0.2),
            ..TwoQubitTiming::default()
        })
    }

    #[test]
    fn single_qubit_gates_advance_their_own_cursor() {
        let mut b = builder();
        b.apply(Gate::X, &[0]).unwrap();
        b.apply(Gate::Ignore, &[1]).unwrap();
        assert_eq!(b.cursor(0), Some(20.0));
        assert_eq!(b.cursor(1), Some(0.0));
    }

    #[test]
    fn cz_syncs_and_reserves_round_trip() {
        let mut b = builder();
        b.apply(Gate::IdleWait, &[1]).unwrap();
        b.apply(Gate::Cz, &[0, 1]).unwrap();

        // 2·20 + 2·8 + 30 after the later qubit (10 ns).
        assert_eq!(b.cursor(0), Some(96.0));
        assert_eq!(b.cursor(1), Some(96.0));
        assert_relative_eq!(b.xy_phase(0).unwrap(), 0.3);
        assert_relative_eq!(b.xy_phase(1).unwrap(), -0.2);

        let schedule = b.finish();
        let cz = &schedule.ops[1];
        let pulse = cz.pulse.as_ref().unwrap();
        assert_eq!(cz.start, 10.0);
        assert_eq!(pulse.start, 18.0);
        assert!(pulse.return_trip);
    }

    #[test]
    fn xy_drive_phase_includes_virtual_z() {
        let mut b = builder();
        b.apply(Gate::Cz, &[0, 1]).unwrap();
        b.apply(Gate::Y, &[0]).unwrap();
        let schedule = b.finish();
        let y = schedule.ops.last().unwrap();
        assert_relative_eq!(y.drive_phase.unwrap(), std::f64::consts::FRAC_PI_2 + 0.3);
    }

    #[test]
    fn layers_parse_and_sync() {
        let layers = parse_layers("X/2, I ; CZ; -Y,IW").unwrap();
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[1], vec![Gate::Cz]);

        let mut b = builder();
        for layer in &layers {
            b.apply_layer(layer).unwrap();
        }
        let schedule = b.finish();
        assert_eq!(schedule.end_times, vec![20.0 + 86.0 + 20.0; 2]);
        assert_eq!(schedule.duration(), 126.0);
    }

    #[test]
    fn arity_and_index_errors() {
        let mut b = builder();
        assert!(b.apply(Gate::Cz, &[0]).is_err());
        assert!(b.apply(Gate::X, &[2]).is_err());
        assert!(b.apply(Gate::Cnot, &[1, 1]).is_err());
        assert!(b.apply_layer(&[Gate::X]).is_err());
        assert!(parse_layers("X, Q").is_err());
    }
}
