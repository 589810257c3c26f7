// Display formatting per category

use sensorhub::format::*;
use sensorhub::models::{Category, Reading};

#[test]
fn unit_per_category() {
    assert_eq!(format_value(Category::Temperature, "CPU", 42.5), "42.5 °C");
    assert_eq!(format_value(Category::Voltage, "VDD_IN", 5.08), "5.080 V");
    assert_eq!(format_value(Category::Current, "VDD_IN", 1.25), "1.250 A");
    assert_eq!(format_value(Category::Cpu, "total", 45.5), "45.5%");
    assert_eq!(format_value(Category::Cpu, "total_processors", 8.0), "8");
    assert_eq!(format_value(Category::Memory, "used_percent", 12.0), "12.0%");
    assert_eq!(
        format_value(Category::Memory, "total", 16.0 * 1024.0 * 1024.0 * 1024.0),
        "16.0 GB"
    );
    assert_eq!(format_value(Category::Disk, "free", 2048.0), "2.0 KB");
}

#[test]
fn reading_uses_its_category() {
    let r = Reading::new(Category::Temperature, "GPU", 61.0, 0);
    assert_eq!(format_reading(&r), "61.0 °C");
}

#[test]
fn usage_line() {
    let gb = 1024 * 1024 * 1024;
    assert_eq!(format_usage(4 * gb, 16 * gb), "25.0% (4.0 GB of 16.0 GB)");
    assert_eq!(format_usage(0, 0), "0.0% (0 bytes of 0 bytes)");
}
