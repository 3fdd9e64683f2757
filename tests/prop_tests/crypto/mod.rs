mod prop_sign;
