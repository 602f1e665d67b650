pub mod comment;
pub mod idea;
pub mod user;

/// Departments known to the organisation directory.
pub const DEPARTMENTS: [&str; 9] = [
    "Engineering",
    "Marketing",
    "Finance",
    "HR",
    "Operations",
    "Product",
    "Sales",
    "Legal",
    "Customer Support",
];

/// Categories offered on the submission form.
pub const CATEGORIES: [&str; 9] = [
    "Process Improvement",
    "Product Enhancement",
    "Cost Saving",
    "Employee Experience",
    "Customer Experience",
    "Sustainability",
    "Technology Innovation",
    "Revenue Generation",
    "Risk Reduction",
];
