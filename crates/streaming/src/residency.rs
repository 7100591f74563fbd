/// Lifecycle of one cached texture.
///
/// `Requested → Resident | Absent`, and everything becomes `Released` on
/// teardown. `Absent` is terminal for the scene lifetime: a failed uri is not
/// fetched again.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResidencyState {
    Requested,
    Resident,
    Absent,
    Released,
}

impl ResidencyState {
    pub fn is_settled(self) -> bool {
        matches!(self, ResidencyState::Resident | ResidencyState::Absent)
    }
}
