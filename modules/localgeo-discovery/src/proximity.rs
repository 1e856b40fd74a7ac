use localgeo_common::GeoPoint;

/// Anything with a fixed location a proximity query can measure against.
pub trait Located {
    fn location(&self) -> &GeoPoint;
}

impl Located for GeoPoint {
    fn location(&self) -> &GeoPoint {
        self
    }
}

/// Radius query over a collection of located records.
///
/// Implementations must return exactly the records whose great-circle
/// distance from `center` is `<= radius_miles` (all records when the radius
/// is `None`), in the collection's own order.
pub trait ProximityIndex {
    type Record: Located;

    fn nearby(&self, center: &GeoPoint, radius_miles: Option<f64>) -> Vec<&Self::Record>;
}

/// Full-scan index: one distance computation per record, per query.
#[derive(Debug, Clone, Default)]
pub struct ScanIndex<R> {
    records: Vec<R>,
}

impl<R: Located> ScanIndex<R> {
    pub fn new(records: Vec<R>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<R: Located> ProximityIndex for ScanIndex<R> {
    type Record = R;

    fn nearby(&self, center: &GeoPoint, radius_miles: Option<f64>) -> Vec<&R> {
        nearby(center, radius_miles, &self.records)
    }
}

/// Records within `radius_miles` of `center`, boundary inclusive, in source
/// order. No radius means no distance filter.
pub fn nearby<'a, R: Located>(
    center: &GeoPoint,
    radius_miles: Option<f64>,
    records: &'a [R],
) -> Vec<&'a R> {
    match radius_miles {
        None => records.iter().collect(),
        Some(radius) => records
            .iter()
            .filter(|r| center.distance_miles(r.location()) <= radius)
            .collect(),
    }
}
