//! Motor Cursor CLI - dry-run entry point
//!
//! Runs a short scripted session against a recording backend on a virtual
//! clock and prints what a real input device would have received.

use motor_cursor::motion::{InputEvent, RecordingBackend, VirtualClock};
use motor_cursor::{
    executor_from_settings, MotionCommand, MotionConfig, MouseButton, Rect, ScreenPoint, Settings,
};

fn main() {
    println!("Motor Cursor - Human Pointer Motion Synthesis");
    println!("=============================================");
    println!();

    let settings = Settings {
        motion: MotionConfig::deterministic(2024),
        ..Default::default()
    };
    let clock = VirtualClock::new();
    let backend = RecordingBackend::new().with_clock(clock.clone());

    let mut executor = match executor_from_settings(settings, backend.clone(), clock) {
        Ok(executor) => executor,
        Err(e) => {
            eprintln!("Invalid settings: {}", e);
            return;
        }
    };

    println!("Profile:");
    let profile = executor.profile();
    println!("  - Hand Bias: {:.2}", profile.dominant_hand_bias);
    println!(
        "  - Tremor: {:.1} Hz, {:.2} px",
        profile.tremor_frequency_hz, profile.tremor_amplitude_px
    );
    println!("  - Fitts: a={:.0} ms, b={:.0} ms", profile.fitts_a_ms, profile.fitts_b_ms);
    println!();

    let button = Rect::new(1500, 820, 120, 40);
    let script = [
        (
            "move",
            MotionCommand::MoveTo {
                target: ScreenPoint::new(300, 200),
                width: 24.0,
            },
        ),
        (
            "click in button",
            MotionCommand::ClickIn {
                rect: button,
                button: MouseButton::Left,
            },
        ),
        ("scroll", MotionCommand::Scroll { amount: 4 }),
        (
            "drag",
            MotionCommand::Drag {
                from: ScreenPoint::new(400, 400),
                to: ScreenPoint::new(900, 600),
                button: MouseButton::Left,
            },
        ),
        ("idle drift", MotionCommand::IdleDrift),
    ];

    for (label, command) in script {
        backend.clear();
        match executor.run(command) {
            Ok(outcome) => {
                let notes: String = [
                    (outcome.overshoot, ", overshoot"),
                    (outcome.micro_correction, ", micro-correction"),
                    (outcome.misclick, ", misclick"),
                ]
                .iter()
                .filter(|(happened, _)| *happened)
                .map(|(_, note)| *note)
                .collect();
                println!(
                    "{:<16} -> {:?} in {:>4} ms, {:>3} events{}",
                    label,
                    outcome.final_position,
                    outcome.elapsed.as_millis(),
                    backend.len(),
                    notes
                );
            }
            Err(e) => println!("{:<16} -> failed: {}", label, e),
        }

        let clicks = backend
            .events()
            .iter()
            .filter(|e| matches!(e.event, InputEvent::ButtonDown(_)))
            .count();
        if clicks > 0 {
            println!("{:<16}    {} button press(es)", "", clicks);
        }
    }
}
