/// Quote breakdown for a taxi fare. Quoting only; a booking's totalAmount
/// is stored independently of this.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FareQuote {
    pub base_fare: f64,
    pub hourly_charge: f64,
    pub minimum_fare: f64,
    pub total_fare: f64,
}

/// `max(pricePerKm * distance + pricePerHour * hours, minimumFare)`.
/// Inputs are expected non-negative; rates come from the taxi record.
pub fn estimate(
    price_per_km: f64,
    price_per_hour: f64,
    minimum_fare: f64,
    distance_km: f64,
    hours: f64,
) -> FareQuote {
    let base_fare = price_per_km * distance_km;
    let hourly_charge = price_per_hour * hours;
    let total_fare = (base_fare + hourly_charge).max(minimum_fare);

    FareQuote {
        base_fare,
        hourly_charge,
        minimum_fare,
        total_fare,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_fare_above_minimum() {
        let quote = estimate(10.0, 0.0, 40.0, 5.0, 0.0);
        assert_eq!(quote.base_fare, 50.0);
        assert_eq!(quote.total_fare, 50.0);
    }

    #[test]
    fn minimum_fare_floor_applies() {
        let quote = estimate(10.0, 0.0, 40.0, 2.0, 0.0);
        assert_eq!(quote.base_fare, 20.0);
        assert_eq!(quote.total_fare, 40.0);
    }

    #[test]
    fn hourly_charge_added() {
        let quote = estimate(10.0, 100.0, 0.0, 3.0, 2.0);
        assert_eq!(quote.base_fare, 30.0);
        assert_eq!(quote.hourly_charge, 200.0);
        assert_eq!(quote.total_fare, 230.0);
    }

    #[test]
    fn zero_inputs_fall_back_to_minimum() {
        let quote = estimate(12.0, 150.0, 99.0, 0.0, 0.0);
        assert_eq!(quote.total_fare, 99.0);
    }
}
