//! Grows a fractal plant and prints an ASCII preview.
//!
//! Run with: `cargo run --example fractal_plant`

use verdant_lsystem::presets;
use verdant_plant::{Plant, PlantConfig};
use verdant_turtle::{NullSink, TurtleConfig};
use verdant_wind::{Wind, WindParams};

fn main() {
    let config = PlantConfig::from_system(&presets::fractal_plant(), 5)
        .with_turtle(TurtleConfig::default().with_angle(25.0))
        .with_max_symbols(1_000_000);

    let mut plant = Plant::new();
    plant.grow(&config, &mut NullSink).expect("growth failed");

    println!("=== Fractal Plant ===\n");
    println!("Branches: {}", plant.tree().len());
    println!("Roots: {}", plant.tree().roots().len());
    println!("Decorations: {}", plant.decorations().len());
    println!("Warnings: {}", plant.warnings().len());

    // One wind tick, just to show the animation entry point.
    let wind = Wind::new(WindParams::breeze());
    plant.apply_wind(&wind, 0.0);

    // Bounding box in the XY plane.
    let mut min_x = f32::MAX;
    let mut max_x = f32::MIN;
    let mut min_y = f32::MAX;
    let mut max_y = f32::MIN;

    for (_, branch) in plant.tree().iter() {
        min_x = min_x.min(branch.start.x).min(branch.end.x);
        max_x = max_x.max(branch.start.x).max(branch.end.x);
        min_y = min_y.min(branch.start.y).min(branch.end.y);
        max_y = max_y.max(branch.start.y).max(branch.end.y);
    }

    println!(
        "Bounding box: ({:.1}, {:.1}) to ({:.1}, {:.1})",
        min_x, min_y, max_x, max_y
    );

    // Simple ASCII projection, top of the plant at the top.
    println!("\n=== ASCII Preview (60x30) ===\n");

    let width = 60;
    let height = 30;
    let mut canvas = vec![vec![' '; width]; height];

    let scale_x = (width - 1) as f32 / (max_x - min_x).max(0.001);
    let scale_y = (height - 1) as f32 / (max_y - min_y).max(0.001);

    for (_, branch) in plant.tree().iter() {
        let x1 = ((branch.start.x - min_x) * scale_x) as usize;
        let y1 = ((branch.start.y - min_y) * scale_y) as usize;
        let x2 = ((branch.end.x - min_x) * scale_x) as usize;
        let y2 = ((branch.end.y - min_y) * scale_y) as usize;

        let steps = (x2 as i32 - x1 as i32)
            .abs()
            .max((y2 as i32 - y1 as i32).abs()) as usize
            + 1;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (x1 as f32 + (x2 as f32 - x1 as f32) * t) as usize;
            let y = (y1 as f32 + (y2 as f32 - y1 as f32) * t) as usize;
            if x < width && y < height {
                canvas[height - 1 - y][x] = '*';
            }
        }
    }

    for row in canvas {
        println!("{}", row.into_iter().collect::<String>());
    }
}
