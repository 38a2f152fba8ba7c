// Rendering of laid-out documents to a byte format.
// The layout has already decided every position; renderers only draw.

pub mod pdf;
