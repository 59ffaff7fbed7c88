use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::Limits;
use crate::engine::validation::{char_len, is_chilean_mobile, is_letters_only, required_text};
use crate::error::{AppError, ValidationErrors};
use crate::models::driver::{
    Driver, DriverBlock, DriverInput, DriverPatch, DriverState, LicenseClass,
};
use crate::models::fleet::next_id;
use crate::models::truck::TruckClass;

struct ValidDriver {
    name: String,
    license: LicenseClass,
    phone: String,
    origin_base: String,
    truck_class: TruckClass,
}

fn validate(limits: &Limits, input: &DriverInput) -> Result<ValidDriver, AppError> {
    let mut errors = ValidationErrors::new();

    let name = required_text(&mut errors, "name", input.name.as_deref()).and_then(|name| {
        let len = char_len(&name);
        if len < limits.name_min_chars || len > limits.name_max_chars {
            errors.add(
                "name",
                format!(
                    "must be between {} and {} characters",
                    limits.name_min_chars, limits.name_max_chars
                ),
            );
            None
        } else if !is_letters_only(&name) {
            errors.add("name", "may only contain letters");
            None
        } else {
            Some(name)
        }
    });

    let license = required_text(&mut errors, "license", input.license.as_deref()).and_then(
        |license| match license.to_ascii_uppercase().as_str() {
            "A4" => Some(LicenseClass::A4),
            "A5" => Some(LicenseClass::A5),
            _ => {
                errors.add("license", "must be A4 or A5");
                None
            }
        },
    );

    let phone = required_text(&mut errors, "phone", input.phone.as_deref()).and_then(|phone| {
        if is_chilean_mobile(&phone) {
            Some(phone)
        } else {
            errors.add("phone", "must look like +56 9 XXXX XXXX");
            None
        }
    });

    let origin_base = required_text(&mut errors, "origin_base", input.origin_base.as_deref());

    if !errors.is_empty() {
        warn!(%errors, "driver validation failed");
        return Err(AppError::Validation(errors));
    }

    match (name, license, phone, origin_base) {
        (Some(name), Some(license), Some(phone), Some(origin_base)) => Ok(ValidDriver {
            name,
            license,
            phone,
            origin_base,
            truck_class: TruckClass::parse_or_default(input.truck_class.as_deref()),
        }),
        _ => Err(AppError::Internal("driver validation lost a field".to_string())),
    }
}

/// Registers a new driver: Available, no blocks, next dense id.
pub fn create(
    limits: &Limits,
    input: &DriverInput,
    existing: &[Driver],
) -> Result<Driver, AppError> {
    let valid = validate(limits, input)?;
    let id = next_id(existing.iter().map(|driver| driver.id));

    info!(driver_id = id, "driver created");

    Ok(Driver {
        id,
        name: valid.name,
        license: valid.license,
        phone: valid.phone,
        origin_base: valid.origin_base,
        truck_class: valid.truck_class,
        state: DriverState::Available,
        blocks: Vec::new(),
    })
}

/// Merges `patch` over the stored driver and re-validates the result.
pub fn update(
    limits: &Limits,
    id: u64,
    patch: &DriverPatch,
    drivers: &[Driver],
) -> Result<Driver, AppError> {
    let existing = drivers
        .iter()
        .find(|driver| driver.id == id)
        .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))?;

    let merged = DriverInput {
        name: patch.name.clone().or_else(|| Some(existing.name.clone())),
        license: patch
            .license
            .clone()
            .or_else(|| Some(format!("{:?}", existing.license))),
        phone: patch.phone.clone().or_else(|| Some(existing.phone.clone())),
        origin_base: patch
            .origin_base
            .clone()
            .or_else(|| Some(existing.origin_base.clone())),
        truck_class: patch
            .truck_class
            .clone()
            .or_else(|| Some(existing.truck_class.code().to_string())),
    };
    let valid = validate(limits, &merged)?;

    info!(driver_id = id, "driver updated");

    Ok(Driver {
        id,
        name: valid.name,
        license: valid.license,
        phone: valid.phone,
        origin_base: valid.origin_base,
        truck_class: valid.truck_class,
        state: patch.state.unwrap_or(existing.state),
        blocks: existing.blocks.clone(),
    })
}

pub fn assign_trip(driver: &Driver) -> Driver {
    Driver {
        state: DriverState::Busy,
        ..driver.clone()
    }
}

pub fn mark_available(driver: &Driver) -> Driver {
    Driver {
        state: DriverState::Available,
        ..driver.clone()
    }
}

/// Appends a legacy single-date hold; the driver becomes Busy.
pub fn add_block(driver: &Driver, block: DriverBlock) -> Driver {
    let mut updated = driver.clone();
    info!(driver_id = driver.id, date = %block.date, "driver block added");
    updated.blocks.push(block);
    updated.state = DriverState::Busy;
    updated
}

pub fn remove_block(driver: &Driver, date: NaiveDate) -> Driver {
    let mut updated = driver.clone();
    updated.blocks.retain(|block| block.date != date);
    info!(driver_id = driver.id, %date, "driver block removed");
    updated
}
