use std::path::PathBuf;

use coalign_core::detection::DiscEstimate;
use coalign_core::pipeline::config::{AlignmentConfig, AlignmentMethod};
use console::Style;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_alignment_summary(config: &AlignmentConfig, image_count: usize) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Coalign"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(7)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Images"),
        s.value.apply_to(image_count)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output_dir.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Format"),
        s.value.apply_to(config.output_format)
    );
    match config.output_suffix {
        Some(ref suffix) => println!(
            "  {:<14}{}",
            s.label.apply_to("Suffix"),
            s.value.apply_to(suffix)
        ),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Suffix"),
            s.disabled.apply_to("none")
        ),
    }
    println!();

    println!("  {}", s.header.apply_to("Alignment"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Method"),
        s.method.apply_to(config.method)
    );
    match config.method {
        AlignmentMethod::PhaseCorrelation => {
            if config.subpixel {
                println!(
                    "    {:<12}{}",
                    s.label.apply_to("Subpixel"),
                    s.method.apply_to(config.phase.subpixel_method)
                );
            } else {
                println!(
                    "    {:<12}{}",
                    s.label.apply_to("Subpixel"),
                    s.disabled.apply_to("disabled")
                );
            }
        }
        AlignmentMethod::Limb => {
            println!(
                "    {:<12}{}",
                s.label.apply_to("Rays"),
                s.value.apply_to(config.limb.ray_count)
            );
            println!(
                "    {:<12}{}",
                s.label.apply_to("Tolerance"),
                s.value.apply_to(format!("{} px", config.stabilization.tolerance))
            );
        }
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Canvas"),
        s.method.apply_to(config.crop_mode)
    );
    if config.normalize_on_load {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Normalize"),
            s.value.apply_to("yes")
        );
    }
    println!();
}

pub fn print_saved_outputs(paths: &[PathBuf]) {
    let s = Styles::new();
    println!();
    println!(
        "  {} {}",
        s.header.apply_to("Saved"),
        s.value.apply_to(format!("{} aligned images", paths.len()))
    );
    for path in paths {
        println!("    {}", s.path.apply_to(path.display()));
    }
}

pub fn print_disc(disc: &DiscEstimate) {
    let s = Styles::new();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Disc centre"),
        s.value.apply_to(format!("({:.2}, {:.2})", disc.center_x, disc.center_y))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Disc radius"),
        s.value.apply_to(format!("{:.2} px", disc.radius))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Fit residual"),
        s.value.apply_to(format!("{:.3} px", disc.fit_residual))
    );
}
