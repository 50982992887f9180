use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    Booking, BookingStatus, CreatedBy, Role, ServiceDetails, ServiceType, Taxi, Tour, User,
};

fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn parse_ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap_or_else(|_| Utc::now().naive_utc())
}

fn parse_string_list(json: &str) -> Vec<String> {
    serde_json::from_str(json).unwrap_or_default()
}

// ── Users ──

pub fn create_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, name, email, phone, password_hash, role, profile_picture, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        params![
            user.id,
            user.name,
            user.email,
            user.phone,
            user.password_hash,
            user.role.as_str(),
            user.profile_picture,
            fmt_ts(&user.created_at),
        ],
    )?;
    Ok(())
}

fn parse_user_row(row: &rusqlite::Row) -> anyhow::Result<User> {
    let role_str: String = row.get(5)?;
    let created_at_str: String = row.get(7)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        password_hash: row.get(4)?,
        role: Role::parse(&role_str),
        profile_picture: row.get(6)?,
        created_at: parse_ts(&created_at_str),
    })
}

const USER_COLS: &str = "id, name, email, phone, password_hash, role, profile_picture, created_at";

pub fn get_user_by_email(conn: &Connection, email: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        &format!("SELECT {USER_COLS} FROM users WHERE email = ?1"),
        params![email],
        |row| Ok(parse_user_row(row)),
    );

    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
        params![id],
        |row| Ok(parse_user_row(row)),
    );

    match result {
        Ok(user) => Ok(Some(user?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set_user_role(conn: &Connection, id: &str, role: Role) -> anyhow::Result<bool> {
    let now = fmt_ts(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE users SET role = ?1, updated_at = ?2 WHERE id = ?3",
        params![role.as_str(), now, id],
    )?;
    Ok(count > 0)
}

// ── Taxis ──

const TAXI_COLS: &str = "id, name, description, type, category, base_price, price_per_km, \
     price_per_hour, minimum_fare, capacity, features, available_areas, fuel_type, transmission, \
     ac, driver_included, image, is_active, created_by, created_at, updated_at";

pub fn create_taxi(conn: &Connection, taxi: &Taxi) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO taxis (id, name, description, type, category, base_price, price_per_km,
             price_per_hour, minimum_fare, capacity, features, available_areas, fuel_type,
             transmission, ac, driver_included, image, is_active, created_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
        params![
            taxi.id,
            taxi.name,
            taxi.description,
            taxi.taxi_type,
            taxi.category,
            taxi.base_price,
            taxi.price_per_km,
            taxi.price_per_hour,
            taxi.minimum_fare,
            taxi.capacity,
            serde_json::to_string(&taxi.features)?,
            serde_json::to_string(&taxi.available_areas)?,
            taxi.fuel_type,
            taxi.transmission,
            taxi.ac as i32,
            taxi.driver_included as i32,
            taxi.image,
            taxi.is_active as i32,
            taxi.created_by,
            fmt_ts(&taxi.created_at),
            fmt_ts(&taxi.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_taxi(conn: &Connection, taxi: &Taxi) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE taxis SET name = ?1, description = ?2, type = ?3, category = ?4, base_price = ?5,
             price_per_km = ?6, price_per_hour = ?7, minimum_fare = ?8, capacity = ?9,
             features = ?10, available_areas = ?11, fuel_type = ?12, transmission = ?13,
             ac = ?14, driver_included = ?15, image = ?16, is_active = ?17, updated_at = ?18
         WHERE id = ?19",
        params![
            taxi.name,
            taxi.description,
            taxi.taxi_type,
            taxi.category,
            taxi.base_price,
            taxi.price_per_km,
            taxi.price_per_hour,
            taxi.minimum_fare,
            taxi.capacity,
            serde_json::to_string(&taxi.features)?,
            serde_json::to_string(&taxi.available_areas)?,
            taxi.fuel_type,
            taxi.transmission,
            taxi.ac as i32,
            taxi.driver_included as i32,
            taxi.image,
            taxi.is_active as i32,
            fmt_ts(&taxi.updated_at),
            taxi.id,
        ],
    )?;
    Ok(count > 0)
}

fn parse_taxi_row(row: &rusqlite::Row) -> anyhow::Result<Taxi> {
    let features_json: String = row.get(10)?;
    let areas_json: String = row.get(11)?;
    let created_at_str: String = row.get(19)?;
    let updated_at_str: String = row.get(20)?;

    Ok(Taxi {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        taxi_type: row.get(3)?,
        category: row.get(4)?,
        base_price: row.get(5)?,
        price_per_km: row.get(6)?,
        price_per_hour: row.get(7)?,
        minimum_fare: row.get(8)?,
        capacity: row.get(9)?,
        features: parse_string_list(&features_json),
        available_areas: parse_string_list(&areas_json),
        fuel_type: row.get(12)?,
        transmission: row.get(13)?,
        ac: row.get::<_, i32>(14)? != 0,
        driver_included: row.get::<_, i32>(15)? != 0,
        image: row.get(16)?,
        is_active: row.get::<_, i32>(17)? != 0,
        created_by: row.get(18)?,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

fn collect_taxis(
    stmt: &mut rusqlite::Statement,
    params: &[&dyn rusqlite::types::ToSql],
) -> anyhow::Result<Vec<Taxi>> {
    let rows = stmt.query_map(params, |row| Ok(parse_taxi_row(row)))?;
    let mut taxis = vec![];
    for row in rows {
        taxis.push(row??);
    }
    Ok(taxis)
}

pub fn list_active_taxis(conn: &Connection) -> anyhow::Result<Vec<Taxi>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TAXI_COLS} FROM taxis WHERE is_active = 1 ORDER BY created_at DESC"
    ))?;
    collect_taxis(&mut stmt, &[])
}

pub fn list_active_taxis_by_category(conn: &Connection, category: &str) -> anyhow::Result<Vec<Taxi>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TAXI_COLS} FROM taxis WHERE category = ?1 AND is_active = 1 ORDER BY created_at DESC"
    ))?;
    collect_taxis(&mut stmt, &[&category])
}

pub fn list_taxis_by_owner(conn: &Connection, owner_id: &str) -> anyhow::Result<Vec<Taxi>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TAXI_COLS} FROM taxis WHERE created_by = ?1 ORDER BY created_at DESC"
    ))?;
    collect_taxis(&mut stmt, &[&owner_id])
}

/// Id lookup deliberately ignores `is_active` so historical bookings stay
/// resolvable; listing queries do the public filtering.
pub fn get_taxi_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Taxi>> {
    let result = conn.query_row(
        &format!("SELECT {TAXI_COLS} FROM taxis WHERE id = ?1"),
        params![id],
        |row| Ok(parse_taxi_row(row)),
    );

    match result {
        Ok(taxi) => Ok(Some(taxi?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_taxi_by_name(conn: &Connection, name: &str) -> anyhow::Result<Option<Taxi>> {
    let result = conn.query_row(
        &format!("SELECT {TAXI_COLS} FROM taxis WHERE name = ?1"),
        params![name],
        |row| Ok(parse_taxi_row(row)),
    );

    match result {
        Ok(taxi) => Ok(Some(taxi?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set_taxi_active(conn: &Connection, id: &str, active: bool) -> anyhow::Result<bool> {
    let now = fmt_ts(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE taxis SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
        params![active as i32, now, id],
    )?;
    Ok(count > 0)
}

// ── Tours ──

const TOUR_COLS: &str = "id, name, description, type, duration, price, category, features, \
     inclusions, places, image, max_capacity, min_capacity, is_active, created_by, created_at, updated_at";

pub fn create_tour(conn: &Connection, tour: &Tour) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO tours (id, name, description, type, duration, price, category, features,
             inclusions, places, image, max_capacity, min_capacity, is_active, created_by,
             created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            tour.id,
            tour.name,
            tour.description,
            tour.tour_type,
            tour.duration,
            tour.price,
            tour.category,
            serde_json::to_string(&tour.features)?,
            serde_json::to_string(&tour.inclusions)?,
            serde_json::to_string(&tour.places)?,
            tour.image,
            tour.max_capacity,
            tour.min_capacity,
            tour.is_active as i32,
            tour.created_by,
            fmt_ts(&tour.created_at),
            fmt_ts(&tour.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_tour(conn: &Connection, tour: &Tour) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE tours SET name = ?1, description = ?2, type = ?3, duration = ?4, price = ?5,
             category = ?6, features = ?7, inclusions = ?8, places = ?9, image = ?10,
             max_capacity = ?11, min_capacity = ?12, is_active = ?13, updated_at = ?14
         WHERE id = ?15",
        params![
            tour.name,
            tour.description,
            tour.tour_type,
            tour.duration,
            tour.price,
            tour.category,
            serde_json::to_string(&tour.features)?,
            serde_json::to_string(&tour.inclusions)?,
            serde_json::to_string(&tour.places)?,
            tour.image,
            tour.max_capacity,
            tour.min_capacity,
            tour.is_active as i32,
            fmt_ts(&tour.updated_at),
            tour.id,
        ],
    )?;
    Ok(count > 0)
}

fn parse_tour_row(row: &rusqlite::Row) -> anyhow::Result<Tour> {
    let features_json: String = row.get(7)?;
    let inclusions_json: String = row.get(8)?;
    let places_json: String = row.get(9)?;
    let created_at_str: String = row.get(15)?;
    let updated_at_str: String = row.get(16)?;

    Ok(Tour {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        tour_type: row.get(3)?,
        duration: row.get(4)?,
        price: row.get(5)?,
        category: row.get(6)?,
        features: parse_string_list(&features_json),
        inclusions: parse_string_list(&inclusions_json),
        places: parse_string_list(&places_json),
        image: row.get(10)?,
        max_capacity: row.get(11)?,
        min_capacity: row.get(12)?,
        is_active: row.get::<_, i32>(13)? != 0,
        created_by: row.get(14)?,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

fn collect_tours(
    stmt: &mut rusqlite::Statement,
    params: &[&dyn rusqlite::types::ToSql],
) -> anyhow::Result<Vec<Tour>> {
    let rows = stmt.query_map(params, |row| Ok(parse_tour_row(row)))?;
    let mut tours = vec![];
    for row in rows {
        tours.push(row??);
    }
    Ok(tours)
}

pub fn list_active_tours(conn: &Connection) -> anyhow::Result<Vec<Tour>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TOUR_COLS} FROM tours WHERE is_active = 1 ORDER BY created_at DESC"
    ))?;
    collect_tours(&mut stmt, &[])
}

pub fn list_active_tours_by_category(conn: &Connection, category: &str) -> anyhow::Result<Vec<Tour>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TOUR_COLS} FROM tours WHERE category = ?1 AND is_active = 1 ORDER BY created_at DESC"
    ))?;
    collect_tours(&mut stmt, &[&category])
}

pub fn list_tours_by_owner(conn: &Connection, owner_id: &str) -> anyhow::Result<Vec<Tour>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TOUR_COLS} FROM tours WHERE created_by = ?1 ORDER BY created_at DESC"
    ))?;
    collect_tours(&mut stmt, &[&owner_id])
}

pub fn get_tour_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Tour>> {
    let result = conn.query_row(
        &format!("SELECT {TOUR_COLS} FROM tours WHERE id = ?1"),
        params![id],
        |row| Ok(parse_tour_row(row)),
    );

    match result {
        Ok(tour) => Ok(Some(tour?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_tour_by_name(conn: &Connection, name: &str) -> anyhow::Result<Option<Tour>> {
    let result = conn.query_row(
        &format!("SELECT {TOUR_COLS} FROM tours WHERE name = ?1"),
        params![name],
        |row| Ok(parse_tour_row(row)),
    );

    match result {
        Ok(tour) => Ok(Some(tour?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn set_tour_active(conn: &Connection, id: &str, active: bool) -> anyhow::Result<bool> {
    let now = fmt_ts(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE tours SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
        params![active as i32, now, id],
    )?;
    Ok(count > 0)
}

// ── Bookings ──

const BOOKING_COLS: &str = "id, customer_name, customer_phone, customer_email, pickup_location, \
     drop_location, pickup_date, pickup_time, service_type, service_id, service_name, passengers, \
     distance, hours, total_amount, special_requests, status, booking_number, created_by, \
     created_by_user_id, service_admin, service_details, created_at, updated_at";

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, customer_name, customer_phone, customer_email, pickup_location,
             drop_location, pickup_date, pickup_time, service_type, service_id, service_name,
             passengers, distance, hours, total_amount, special_requests, status, booking_number,
             created_by, created_by_user_id, service_admin, service_details, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
             ?19, ?20, ?21, ?22, ?23, ?24)",
        params![
            booking.id,
            booking.customer_name,
            booking.customer_phone,
            booking.customer_email,
            booking.pickup_location,
            booking.drop_location,
            booking.pickup_date,
            booking.pickup_time,
            booking.service_type.as_str(),
            booking.service_id,
            booking.service_name,
            booking.passengers,
            booking.distance,
            booking.hours,
            booking.total_amount,
            booking.special_requests,
            booking.status.as_str(),
            booking.booking_number,
            booking.created_by.as_str(),
            booking.created_by_user_id,
            booking.service_admin,
            serde_json::to_string(&booking.service_details)?,
            fmt_ts(&booking.created_at),
            fmt_ts(&booking.updated_at),
        ],
    )?;
    Ok(())
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let service_type_str: String = row.get(8)?;
    let status_str: String = row.get(16)?;
    let created_by_str: String = row.get(18)?;
    let details_json: String = row.get(21)?;
    let created_at_str: String = row.get(22)?;
    let updated_at_str: String = row.get(23)?;

    let service_details: ServiceDetails = serde_json::from_str(&details_json)?;

    Ok(Booking {
        id: row.get(0)?,
        customer_name: row.get(1)?,
        customer_phone: row.get(2)?,
        customer_email: row.get(3)?,
        pickup_location: row.get(4)?,
        drop_location: row.get(5)?,
        pickup_date: row.get(6)?,
        pickup_time: row.get(7)?,
        service_type: ServiceType::parse(&service_type_str).unwrap_or(ServiceType::Taxi),
        service_id: row.get(9)?,
        service_name: row.get(10)?,
        passengers: row.get(11)?,
        distance: row.get(12)?,
        hours: row.get(13)?,
        total_amount: row.get(14)?,
        special_requests: row.get(15)?,
        status: BookingStatus::parse(&status_str).unwrap_or(BookingStatus::Pending),
        booking_number: row.get(17)?,
        created_by: CreatedBy::parse(&created_by_str),
        created_by_user_id: row.get(19)?,
        service_admin: row.get(20)?,
        service_details,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

fn collect_bookings(
    stmt: &mut rusqlite::Statement,
    params: &[&dyn rusqlite::types::ToSql],
) -> anyhow::Result<Vec<Booking>> {
    let rows = stmt.query_map(params, |row| Ok(parse_booking_row(row)))?;
    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn list_bookings(conn: &Connection) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLS} FROM bookings ORDER BY created_at DESC, id"
    ))?;
    collect_bookings(&mut stmt, &[])
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_bookings_by_phone(conn: &Connection, phone: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLS} FROM bookings WHERE customer_phone = ?1 ORDER BY created_at DESC, id"
    ))?;
    collect_bookings(&mut stmt, &[&phone])
}

pub fn list_bookings_by_service_type(
    conn: &Connection,
    service_type: ServiceType,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLS} FROM bookings WHERE service_type = ?1 ORDER BY created_at DESC, id"
    ))?;
    collect_bookings(&mut stmt, &[&service_type.as_str()])
}

pub fn list_bookings_by_service_admin(
    conn: &Connection,
    admin_id: &str,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLS} FROM bookings WHERE service_admin = ?1 ORDER BY created_at DESC, id"
    ))?;
    collect_bookings(&mut stmt, &[&admin_id])
}

pub fn update_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, total_amount = ?2, special_requests = ?3, updated_at = ?4
         WHERE id = ?5",
        params![
            booking.status.as_str(),
            booking.total_amount,
            booking.special_requests,
            fmt_ts(&booking.updated_at),
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

/// Phone match doubles as the authorization check: a wrong phone updates
/// nothing and the caller learns only "not found". Terminal bookings never
/// transition.
pub fn cancel_booking_for_phone(conn: &Connection, id: &str, phone: &str) -> anyhow::Result<bool> {
    let now = fmt_ts(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET status = 'cancelled', updated_at = ?1
         WHERE id = ?2 AND customer_phone = ?3 AND status IN ('pending', 'confirmed')",
        params![now, id, phone],
    )?;
    Ok(count > 0)
}

pub struct BookingStats {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub taxi: i64,
    pub tour: i64,
    pub total_revenue: f64,
}

pub fn get_booking_stats(conn: &Connection) -> anyhow::Result<BookingStats> {
    conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(status = 'pending'), 0),
                COALESCE(SUM(status = 'confirmed'), 0),
                COALESCE(SUM(status = 'completed'), 0),
                COALESCE(SUM(status = 'cancelled'), 0),
                COALESCE(SUM(service_type = 'taxi'), 0),
                COALESCE(SUM(service_type = 'tour'), 0),
                COALESCE(SUM(CASE WHEN status = 'completed' THEN total_amount ELSE 0 END), 0.0)
         FROM bookings",
        [],
        |row| {
            Ok(BookingStats {
                total: row.get(0)?,
                pending: row.get(1)?,
                confirmed: row.get(2)?,
                completed: row.get(3)?,
                cancelled: row.get(4)?,
                taxi: row.get(5)?,
                tour: row.get(6)?,
                total_revenue: row.get(7)?,
            })
        },
    )
    .map_err(Into::into)
}
