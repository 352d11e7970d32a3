//! Mock collaborators.
