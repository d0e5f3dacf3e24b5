
mod lookup_tests;
mod matcher_tests;
mod phonenumberutil_tests;
