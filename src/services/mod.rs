pub(crate) mod allocator;
pub(crate) mod blueprint;
pub(crate) mod coach;
pub(crate) mod exam_timing;
pub(crate) mod finalize;
pub(crate) mod performance;
pub(crate) mod reporting;
