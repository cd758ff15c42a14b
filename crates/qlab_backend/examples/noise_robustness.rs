//! QLAB Noise Robustness Report
//!
//! Two experiments over a sweep of noise strengths:
//! Bell correlations read out in the Z and X bases, and the
//! population metrics of GHZ and W states.

use qlab_backend::prelude::*;
use qlab_core::{Basis, Circuit, CircuitBuilder, GateKind};
use qlab_noise::{NoiseChannel, NoiseModel};

const SHOTS: u64 = 4096;
const SEED: u64 = 42;

fn main() -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════════════════════╗");
    println!("║                   QLAB Noise Robustness Report                       ║");
    println!("╚══════════════════════════════════════════════════════════════════════╝\n");

    let noise_levels = [0.0, 0.05, 0.10, 0.20, 0.30, 0.50];

    println!("Configuration:");
    println!("  • Noise levels: {:?}", noise_levels);
    println!("  • Shots per circuit: {}", SHOTS);
    println!("  • Random seed: {}", SEED);
    println!();

    // =========================================================================
    // Experiment 1: Bell correlations, Z vs X basis
    // =========================================================================
    println!("═══════════════════════════════════════════════════════════════════════");
    println!("  EXPERIMENT 1: Bell correlation P(00) + P(11)");
    println!("═══════════════════════════════════════════════════════════════════════\n");

    let bell_z = bell(Basis::Z)?;
    let bell_x = bell(Basis::X)?;

    println!("┌──────────┬──────────┬──────────┬──────────┬──────────┐");
    println!("│ p        │ Phase Z  │ Phase X  │ Depol Z  │ Depol X  │");
    println!("├──────────┼──────────┼──────────┼──────────┼──────────┤");

    for &p in &noise_levels {
        let phase = single_qubit_noise(NoiseChannel::phase_damping(p)?)?;
        let depol = single_qubit_noise(NoiseChannel::depolarizing(p, 1)?)?;

        let exact = |model: &NoiseModel, circuit: &Circuit| -> anyhow::Result<f64> {
            let result = Simulator::exact(model.clone())
                .with_seed(SEED)
                .execute(circuit, SHOTS)?;
            Ok(result.probability("00") + result.probability("11"))
        };

        println!(
            "│ {:.2}     │ {:.4}   │ {:.4}   │ {:.4}   │ {:.4}   │",
            p,
            exact(&phase, &bell_z)?,
            exact(&phase, &bell_x)?,
            exact(&depol, &bell_z)?,
            exact(&depol, &bell_x)?
        );
    }
    println!("└──────────┴──────────┴──────────┴──────────┴──────────┘\n");

    println!("  • Phase damping leaves Z correlations intact and erodes X correlations");
    println!("  • Depolarizing noise erodes both\n");

    // =========================================================================
    // Experiment 2: GHZ vs W populations
    // =========================================================================
    println!("═══════════════════════════════════════════════════════════════════════");
    println!("  EXPERIMENT 2: GHZ vs W robustness (3 qubits, trajectories)");
    println!("═══════════════════════════════════════════════════════════════════════\n");

    let ghz = CircuitBuilder::new(3).ghz().measure_all().build()?;
    let w = w_state()?;

    println!("┌──────────┬──────────┬──────────┬──────────┐");
    println!("│ p        │ GHZ      │ W        │ Coverage │");
    println!("├──────────┼──────────┼──────────┼──────────┤");

    for &p in &noise_levels {
        let model = NoiseModel::new()
            .with_all_qubit_error(NoiseChannel::depolarizing(p, 1)?, &[GateKind::H, GateKind::Ry])?
            .with_all_qubit_error(NoiseChannel::depolarizing(p, 2)?, &[GateKind::Cx])?;
        let simulator = Simulator::trajectory(model).with_seed(SEED);

        let ghz_result = simulator.execute(&ghz, SHOTS)?;
        let w_result = simulator.execute(&w, SHOTS)?;

        let m_ghz = ghz_result.probability("000") + ghz_result.probability("111");
        let m_w = ["001", "010", "100"]
            .iter()
            .map(|bs| w_result.probability(bs))
            .sum::<f64>();

        println!(
            "│ {:.2}     │ {:.4}   │ {:.4}   │ {:8} │",
            p,
            m_ghz,
            m_w,
            if ghz_result.coverage.is_complete() { "full" } else { "partial" }
        );
    }
    println!("└──────────┴──────────┴──────────┴──────────┘\n");

    println!("  • The GHZ metric drops sharply with noise");
    println!("  • The W metric degrades more smoothly");

    Ok(())
}

fn bell(basis: Basis) -> anyhow::Result<Circuit> {
    Ok(CircuitBuilder::new(2)
        .h(0)
        .cx(0, 1)
        .id(0)
        .id(1)
        .measure_in_basis(0, 0, basis)
        .measure_in_basis(1, 1, basis)
        .build()?)
}

fn w_state() -> anyhow::Result<Circuit> {
    Ok(CircuitBuilder::new(3)
        .ry(0, 2.0 * 0.61548)
        .cx(0, 1)
        .ry(1, 2.0 * 0.95532)
        .cx(1, 2)
        .cx(0, 1)
        .measure_all()
        .build()?)
}

/// Same channel after every idle and Hadamard
fn single_qubit_noise(channel: NoiseChannel) -> anyhow::Result<NoiseModel> {
    Ok(NoiseModel::new().with_all_qubit_error(channel, &[GateKind::Id, GateKind::H])?)
}
