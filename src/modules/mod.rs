pub mod student_imports;
