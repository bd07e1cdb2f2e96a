use std::env;
use std::fs;
use std::process;

use ridgeview::{
    decode, export_filename, filter_records, format_date, format_height, labels, parse,
    EftError, EftResult,
};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <file.eft> [finger] [format]", args[0]);
        eprintln!("  finger: position number 1-14 or a name like right_thumb");
        eprintln!("  format: tiff (default) or png");
        process::exit(2);
    }

    let finger = args.get(2).map(String::as_str);
    let format = args.get(3).map(String::as_str);

    if let Err(err) = run(&args[1], finger, format) {
        eprintln!("{}: {}", err.kind(), err);
        process::exit(1);
    }
}

fn run(path: &str, finger: Option<&str>, format: Option<&str>) -> EftResult<()> {
    let bytes = fs::read(path)?;
    let eft = parse(&bytes)?;

    println!("{} ({} bytes)", path, eft.file_size);
    println!();

    println!("Type-1 transaction fields:");
    for (tag, value) in eft.type1.iter() {
        println!("  {:<8} {}", tag, printable(value));
    }
    println!();

    let who = &eft.type2;
    println!("Type-2 demographics:");
    if let Some(name) = who.full_name() {
        println!("  Name:         {}", name);
    }
    println!("  Born:         {}", format_date(who.dob.as_ref()));
    if let Some(sex) = &who.sex {
        println!("  Sex:          {}", coded(sex, labels::sex_label(sex)));
    }
    if let Some(race) = &who.race {
        println!("  Race:         {}", coded(race, labels::race_label(race)));
    }
    if let Some(height) = &who.height {
        println!("  Height:       {}", format_height(height));
    }
    if let Some(weight) = who.weight {
        println!("  Weight:       {} lbs", weight);
    }
    if let Some(eyes) = &who.eye_color {
        println!("  Eyes:         {}", coded(eyes, labels::eye_color_label(eyes)));
    }
    if let Some(hair) = &who.hair_color {
        println!("  Hair:         {}", coded(hair, labels::hair_color_label(hair)));
    }
    if let Some(scanner) = &who.scanner {
        println!(
            "  Scanner:      {} {} (serial {})",
            scanner.make, scanner.model, scanner.serial
        );
    }
    if who.date_captured.is_some() {
        println!("  Captured:     {}", format_date(who.date_captured.as_ref()));
    }
    println!();

    println!("Type-4 fingerprint records:");
    for record in &eft.type4_records {
        println!(
            "  [{}] {} - {} - {}x{} @ {} PPI - {} - {} bytes",
            record.idc,
            record.finger_name(),
            record.impression_name(),
            record.width,
            record.height,
            record.ppi(),
            record.compression_name(),
            record.image_data.len()
        );
    }
    println!();

    let selected = filter_records(&eft.type4_records, finger)?;
    for record in selected {
        if record.compression != 1 {
            println!(
                "Skipping IDC {}: {} payloads are not decodable here",
                record.idc,
                record.compression_name()
            );
            continue;
        }

        let image = decode(record.image_data)?;
        let filename = export_filename(record.finger_position, format);
        let raster = image::GrayImage::from_raw(
            image.width as u32,
            image.height as u32,
            image.pixels,
        )
        .ok_or_else(|| EftError::decode("Decoded raster has inconsistent dimensions"))?;
        raster
            .save(&filename)
            .map_err(|e| EftError::decode(format!("Failed to save {}: {}", filename, e)))?;
        println!(
            "Decoded IDC {} ({}x{}) -> {}",
            record.idc, image.width, image.height, filename
        );
    }

    Ok(())
}

/// Show a code with its label when one is known.
fn coded(code: &str, label: Option<&'static str>) -> String {
    match label {
        Some(label) => format!("{} ({})", label, code),
        None => code.to_string(),
    }
}

/// Keep control characters out of the terminal; Type-1 values can embed
/// subfield separators.
fn printable(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { '|' } else { c })
        .collect()
}
